use plugdesc_logger as logger;
use plugdesc_manifest::Messager;

/// Prints generation diagnostics through the CLI logger
#[derive(Debug, Default)]
pub struct LoggerMessager {
    reported: usize,
}

impl LoggerMessager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of diagnostics printed so far
    pub fn reported(&self) -> usize {
        self.reported
    }
}

impl Messager for LoggerMessager {
    fn error(&mut self, message: &str, origin: Option<&str>) {
        self.reported += 1;
        match origin {
            Some(origin) => logger::error(&format!("{}\n  --> {}", message, origin)),
            None => logger::error(message),
        }
    }
}
