/// Output sink abstraction for user-facing messages.
///
/// The core library never prints; anything interactive goes through a
/// `Reporter` injected by the caller. The CLI wires `ConsoleReporter`;
/// tests can capture output with their own implementation.
pub trait Reporter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Reporter writing to stdout (success/info) and stderr (error/warn).
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn success(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recording(RefCell<Vec<String>>);

    impl Reporter for Recording {
        fn success(&self, message: &str) {
            self.0.borrow_mut().push(format!("ok:{message}"));
        }
        fn error(&self, message: &str) {
            self.0.borrow_mut().push(format!("err:{message}"));
        }
        fn info(&self, message: &str) {
            self.0.borrow_mut().push(format!("info:{message}"));
        }
        fn warn(&self, message: &str) {
            self.0.borrow_mut().push(format!("warn:{message}"));
        }
    }

    #[test]
    fn test_reporter_is_object_safe() {
        let recording = Recording(RefCell::new(Vec::new()));
        let reporter: &dyn Reporter = &recording;
        reporter.success("added");
        reporter.error("missing");
        assert_eq!(
            *recording.0.borrow(),
            vec!["ok:added".to_string(), "err:missing".to_string()]
        );
    }
}
