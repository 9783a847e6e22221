use colored::Colorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

pub trait Logger {
    fn log(&self, level: LogLevel, msg: &str);
}

/// Sink for messages the user should see, as opposed to diagnostics.
pub trait Notifier {
    fn notify(&self, msg: &str);
}

pub struct ConsoleLogger {
    pub color: bool,
    pub verbose: bool,
}

impl Logger for ConsoleLogger {
    fn log(&self, level: LogLevel, msg: &str) {
        match level {
            LogLevel::Error => {
                if self.color {
                    eprintln!("{}", msg.red());
                } else {
                    eprintln!("{}", msg);
                }
            }
            LogLevel::Info => println!("{}", msg),
            LogLevel::Debug => {
                if !self.verbose {
                    return;
                }
                if self.color {
                    println!("{}", msg.cyan());
                } else {
                    println!("{}", msg);
                }
            }
        }
    }
}

impl Notifier for ConsoleLogger {
    fn notify(&self, msg: &str) {
        if self.color {
            eprintln!("{}", msg.yellow());
        } else {
            eprintln!("{}", msg);
        }
    }
}

pub struct EmptyLogger;

impl Logger for EmptyLogger {
    fn log(&self, _level: LogLevel, _msg: &str) {}
}

impl Notifier for EmptyLogger {
    fn notify(&self, _msg: &str) {}
}
