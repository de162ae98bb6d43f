use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a file entirely into a Vec.
/// Uses exact-size allocation from fstat + a read_full loop, falling back to
/// read_to_end for special files that report no size.
pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len > 0 {
        let mut buf = vec![0u8; len as usize];
        let n = read_full(&mut file, &mut buf)?;
        buf.truncate(n);
        // The file may have grown since fstat.
        file.read_to_end(&mut buf)?;
        return Ok(buf);
    }
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read all bytes from stdin into a Vec.
pub fn read_stdin() -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    io::stdin().lock().read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read the selection text from `path`, or stdin when `path` is `None` or `-`.
/// Invalid UTF-8 is replaced rather than rejected: a selection is text the
/// user copied, and the decoder only cares about its ASCII alphabet.
pub fn read_text(path: Option<&str>) -> io::Result<String> {
    let data = match path {
        None | Some("-") => read_stdin()?,
        Some(p) => read_file(Path::new(p))?,
    };
    Ok(bytes_to_text(data))
}

/// Take ownership of `data` as text, replacing invalid sequences.
pub fn bytes_to_text(data: Vec<u8>) -> String {
    match String::from_utf8(data) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Read as many bytes as possible into buf, retrying on partial reads.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
