use std::borrow::Cow;
use std::fs::File;
use std::io::{Error, ErrorKind, Read};
use std::path::Path;

use log::debug;

use crate::format::{sniff, SourceFormat, UnrecognizedFormatError};

/// Upper limit on the size of a source. A full bank in the most verbose
/// format is well under this.
const SOURCE_LENGTH_MAX: u64 = 16 * 1024 * 1024;

/// The raw contents of one dump.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Source {
    /// Usually the file name without the extension.
    pub name: Option<String>,
    data: Vec<u8>,
}

impl Source {
    pub fn new(data: impl Into<Vec<u8>>, name: Option<String>) -> Self {
        Self {
            name,
            data: data.into(),
        }
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Source, Error> {
        let mut file = File::open(path.as_ref())?;
        let name = path
            .as_ref()
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().to_string());
        Self::read(&mut file, name)
    }

    pub fn read<R: Read>(reader: &mut R, name: Option<String>) -> Result<Source, Error> {
        let mut data = Vec::new();
        reader.take(SOURCE_LENGTH_MAX + 1).read_to_end(&mut data)?;
        if data.len() as u64 > SOURCE_LENGTH_MAX {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("Source is larger than {SOURCE_LENGTH_MAX} bytes"),
            ));
        }
        debug!("Read {} bytes from {}", data.len(), name.as_deref().unwrap_or("<unnamed>"));
        Ok(Self { name, data })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lines of text with their one based line number. Bytes that are not
    /// UTF-8 are replaced.
    pub fn lines(&self) -> impl Iterator<Item = (usize, Cow<'_, str>)> {
        self.data
            .split(|byte| *byte == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .map(String::from_utf8_lossy)
            .enumerate()
            .map(|(index, line)| (index + 1, line))
    }

    /// Identify the format from the start of the source.
    pub fn sniff(&self) -> Result<SourceFormat, Error> {
        sniff(&self.data).map_err(|_| {
            UnrecognizedFormatError {
                source_name: self.name.clone(),
            }
            .into_io_error()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lines() {
        let source = Source::new(b"one\r\ntwo\nthree".to_vec(), None);
        let lines: Vec<(usize, String)> = source
            .lines()
            .map(|(number, line)| (number, line.into_owned()))
            .collect();
        assert_eq!(
            lines,
            vec![
                (1, "one".to_owned()),
                (2, "two".to_owned()),
                (3, "three".to_owned())
            ]
        );
    }

    #[test]
    fn read() {
        let mut data: &[u8] = b"!j106\\";
        let source = Source::read(&mut data, Some("factory".to_owned())).unwrap();
        assert_eq!(source.len(), 6);
        assert_eq!(source.sniff().unwrap(), SourceFormat::Container);
    }

    #[test]
    fn unrecognized_names_source() {
        let source = Source::new(b"nothing to see".to_vec(), Some("notes".to_owned()));
        let error = source.sniff().unwrap_err();
        assert!(UnrecognizedFormatError::is(&error));
        assert_eq!(error.to_string(), "notes is not a recognized Juno-106 dump");
    }

    #[test]
    fn missing_file() {
        let error = Source::read_file("does-not-exist.106").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
