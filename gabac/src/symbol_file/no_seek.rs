use std::io::{Error, ErrorKind, Read, Seek, SeekFrom};

/// Adapter giving a plain reader the [`Seek`] implementation that
/// `binrw` asks for.
///
/// Only seeks that do not move the position succeed; everything else is an
/// error.
#[derive(Debug)]
pub(crate) struct NoSeek<T> {
    inner: T,
    position: u64,
}

impl<T> NoSeek<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, position: 0 }
    }
}

impl<T> Seek for NoSeek<T> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let is_noop = match pos {
            SeekFrom::Start(i) => i == self.position,
            SeekFrom::Current(i) => i == 0,
            SeekFrom::End(_) => false,
        };

        if is_noop {
            Ok(self.position)
        } else {
            Err(Error::new(
                ErrorKind::Unsupported,
                "Cannot seek in a sequential stream",
            ))
        }
    }
}

impl<R: Read> Read for NoSeek<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = self.inner.read(buf)?;
        self.position += size as u64;
        Ok(size)
    }
}
