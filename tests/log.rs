#[cfg(test)]
mod tests {
	use {
		std::{fs, path::Path, time::Duration},
		tracing::error,
		wayfarer::{global::*, log},
	};

	/// Verifies that `logs/latest.log` is created and written to from log events.
	#[test]
	#[serial_test::serial]
	fn test_logger() {
		//dotenv doesn't work in github actions bc .env is ignored
		unsafe {
			// Safety
			//
			// Always safe on Windows.
			//
			// Other platforms: risk of race condition in multi-threaded environment.
			// We are not reading/writing this environment variable from multiple threads, so we're good.
			std::env::set_var("RUST_LOG", "warn,wayfarer=debug");
		}
		let latest_log_path = Path::new(LOG_DIR).join(LATEST_LOG);
		_ = fs::remove_file(latest_log_path.as_path());
		log::init_logger();
		error!("Test error");
		// The appender is non-blocking; give its worker thread a moment.
		std::thread::sleep(Duration::from_millis(300));
		let logs = fs::read_to_string(latest_log_path).unwrap();
		assert!(!logs.is_empty());
	}

	/// Verifies that `logs/crash.log` is created and written to on a panic.
	#[test]
	#[serial_test::serial]
	fn test_panic_handler() {
		let crash_path = Path::new(LOG_DIR).join(CRASH_LOG);
		_ = fs::remove_file(crash_path.as_path());
		log::init_panic_handler();
		std::panic::catch_unwind(|| {
			panic!("Test panic");
		})
		.unwrap_err();
		assert!(!fs::read_to_string(crash_path).unwrap().is_empty());
	}
}
