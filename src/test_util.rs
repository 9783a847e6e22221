use std::cell::RefCell;

use crate::{Logger, LogLevel, Notifier, Project};

pub struct TestFS {
    root: vfs::VfsPath,
}

impl TestFS {
    pub fn new<I, P, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<[u8]>,
    {
        let fs = vfs::MemoryFS::new();
        let root: vfs::VfsPath = fs.into();
        for (path, content) in entries {
            let p = root.join(path.as_ref()).unwrap();
            let parent = p.parent();
            if parent.as_str() != p.as_str() {
                parent.create_dir_all().unwrap();
            }
            let mut f = p.create_file().unwrap();
            use std::io::Write;
            f.write_all(content.as_ref()).unwrap();
        }
        Self { root }
    }

    pub fn root(&self) -> vfs::VfsPath {
        self.root.clone()
    }

    /// Project rooted at the memory filesystem, posing as `/workspace` on the host.
    pub fn project(&self) -> Project {
        Project::new(self.root(), "/workspace")
    }

    pub fn write(&self, path: &str, content: &str) {
        let mut f = self.root.join(path).unwrap().create_file().unwrap();
        use std::io::Write;
        f.write_all(content.as_bytes()).unwrap();
    }

    pub fn read(&self, path: &str) -> String {
        self.root.join(path).unwrap().read_to_string().unwrap()
    }
}

/// Records everything it is sent.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, msg: &str) {
        self.messages.borrow_mut().push(msg.to_string());
    }
}

impl Logger for RecordingNotifier {
    fn log(&self, level: LogLevel, msg: &str) {
        if level == LogLevel::Error {
            self.messages.borrow_mut().push(msg.to_string());
        }
    }
}
