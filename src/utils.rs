use crate::models::ProbeStatus;

pub fn status_icon(status: ProbeStatus) -> &'static str {
    match status {
        ProbeStatus::Success => "\u{2705}",
        ProbeStatus::Warning => "\u{26a0}\u{fe0f}",
        ProbeStatus::Error => "\u{274c}",
    }
}

/// `media_server_latency` -> `Media Server Latency`, for report headings.
pub fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// The report uses UTF-8 status glyphs; older Windows consoles need the code
// page and VT processing switched on first.
#[cfg(windows)]
pub fn setup_console() {
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleMode, SetConsoleOutputCP,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_OUTPUT_HANDLE,
    };
    unsafe {
        SetConsoleOutputCP(65001);
        let handle = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0;
        if GetConsoleMode(handle, &mut mode) != 0 {
            SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
    }
}

#[cfg(not(windows))]
pub fn setup_console() {}
