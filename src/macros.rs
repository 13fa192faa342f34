//! Internal logging shims that compile away when the `tracing` feature is disabled.

macro_rules! log_event {
	($level:ident, $($arg:tt)+) => {{
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
		#[cfg(not(feature = "tracing"))]
		{
			if false {
				let _ = format!($($arg)+);
			}
		}
	}};
}
