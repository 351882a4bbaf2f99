use std::cell;
use std::collections;
use std::fs;
use std::io;
use std::path;

use failure;

pub const THRESHOLDS_KEY: &'static str = "iot_demo_thresholds";
pub const AUTH_KEY: &'static str = "iot_demo_auth";

/// A durable key-value store holding serialized records as text.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>, failure::Error>;
    fn write(&self, key: &str, value: &str) -> Result<(), failure::Error>;
    fn remove(&self, key: &str) -> Result<(), failure::Error>;
}

impl<'a, S> Storage for &'a S
where
    S: Storage + ?Sized,
{
    fn read(&self, key: &str) -> Result<Option<String>, failure::Error> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), failure::Error> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), failure::Error> {
        (**self).remove(key)
    }
}

/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug)]
pub struct FileStorage {
    dir: path::PathBuf,
}

impl FileStorage {
    pub fn open<P>(dir: P) -> Result<Self, failure::Error>
    where
        P: Into<path::PathBuf>,
    {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            failure::err_msg(format!(
                "could not create storage dir {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(FileStorage { dir })
    }

    fn path(&self, key: &str) -> Result<path::PathBuf, failure::Error> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(self.dir.join(format!("{}.json", key)))
        } else {
            Err(failure::err_msg(format!("invalid storage key {:?}", key)))
        }
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, failure::Error> {
        match fs::read_to_string(self.path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), failure::Error> {
        fs::write(self.path(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), failure::Error> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: cell::RefCell<collections::HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, failure::Error> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), failure::Error> {
        self.values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), failure::Error> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}
