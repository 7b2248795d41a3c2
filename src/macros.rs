// Logging front-end shared by the library and the firmware binary.
// On the target every line goes out through defmt/RTT; on the host the same
// call sites land on the `log` facade so unit tests link without a defmt logger.
// Only use `{}` with primitives so both back-ends accept the format string.

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::info!($($arg)*);
        #[cfg(not(target_os = "none"))]
        ::log::info!($($arg)*);
    }};
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::warn!($($arg)*);
        #[cfg(not(target_os = "none"))]
        ::log::warn!($($arg)*);
    }};
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::error!($($arg)*);
        #[cfg(not(target_os = "none"))]
        ::log::error!($($arg)*);
    }};
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::debug!($($arg)*);
        #[cfg(not(target_os = "none"))]
        ::log::debug!($($arg)*);
    }};
}
