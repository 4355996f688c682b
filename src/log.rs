//! Utilities for logging messages from the library.
//!
//! Diagnostics are printed to stdout whenever the `RELIGHT_LOG` environment
//! variable is set; they are off otherwise.

use once_cell::sync::Lazy;

#[macro_export]
macro_rules! relight_log {
    (
        $($arg:tt)+
    ) => {
        if $crate::log::log_enabled() {
            println!("{}", format_args!($($arg)+));
        }
    };
}

pub fn log_enabled() -> bool {
    static ENABLED: Lazy<bool> = Lazy::new(|| ::std::env::var_os("RELIGHT_LOG").is_some());

    *ENABLED
}
