// Logging wrappers, every log call shows up as its own scope in a profiler trace.

#[macro_export]
macro_rules! profiled_log {
    ($level:ident, $($arg:tt)*) => {
        {
            profiling::scope!(concat!("log::", stringify!($level)));
            ::log::$level!($($arg)*);
        }
    };
}

#[macro_export(local_inner_macros)]
macro_rules! debug {
    ($($a:tt)*) => { profiled_log!(debug, $($a)*); };
}

#[macro_export(local_inner_macros)]
macro_rules! info {
    ($($a:tt)*) => { profiled_log!(info, $($a)*); };
}

#[macro_export(local_inner_macros)]
macro_rules! warn {
    ($($a:tt)*) => { profiled_log!(warn, $($a)*); };
}

#[macro_export(local_inner_macros)]
macro_rules! error {
    ($($a:tt)*) => { profiled_log!(error, $($a)*); };
}
