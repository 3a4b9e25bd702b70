use serde::Deserialize;
use std::error::Error;
use std::io::Read;

const BATCH: usize = 262144;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub name: String,
    pub files: Vec<String>,
}

pub type Manifest = Vec<ManifestItem>;

pub fn parse_manifest(text: &str) -> Result<Manifest, serde_json::Error> {
    serde_json::from_str::<Manifest>(text)
}

/// Splits a byte stream into tokens on spaces, commas, quotes and line
/// breaks, handing them to `f` in batches.
pub struct Tokenizer<F: FnMut(Vec<Box<[u8]>>)> {
    strings: Vec<Box<[u8]>>,
    cached: Vec<u8>,
    f: F,
}

impl<F: FnMut(Vec<Box<[u8]>>)> Tokenizer<F> {
    pub fn new(f: F) -> Self {
        Self {
            strings: Vec::new(),
            cached: Vec::new(),
            f,
        }
    }
    pub fn feed(&mut self, bytes: &[u8]) {
        for c in bytes.iter().copied() {
            match c {
                b' ' | b',' | b'\n' | b'\r' | b'"' => {
                    self.end_token();
                    if self.strings.len() >= BATCH {
                        (self.f)(std::mem::take(&mut self.strings));
                    }
                }
                c => self.cached.push(c),
            }
        }
    }
    fn end_token(&mut self) {
        if !self.cached.is_empty() {
            let token = std::mem::take(&mut self.cached).into_boxed_slice();
            self.strings.push(token);
        }
    }
    /// Emits the pending token and batch.
    pub fn finish(&mut self) {
        self.end_token();
        (self.f)(std::mem::take(&mut self.strings));
    }
}

/// Tokenizes every file of a dataset.
pub fn read<F: FnMut(Vec<Box<[u8]>>)>(dataset_files: &[String], f: F) -> Result<(), Box<dyn Error>> {
    let mut tokenizer = Tokenizer::new(f);
    let mut buffer = vec![0u8; BATCH].into_boxed_slice();
    for dataset_file in dataset_files {
        let mut file = std::fs::OpenOptions::new().read(true).open(dataset_file)?;
        loop {
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => tokenizer.feed(&buffer[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        tokenizer.finish();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens() {
        let mut out = Vec::new();
        let mut tokenizer = Tokenizer::new(|batch: Vec<Box<[u8]>>| out.extend(batch));
        tokenizer.feed(b"a,bb \"ccc\"\r\n");
        tokenizer.feed(b"dd");
        tokenizer.feed(b"d");
        tokenizer.finish();
        drop(tokenizer);
        let out: Vec<&[u8]> = out.iter().map(|x| x.as_ref()).collect();
        assert_eq!(out, vec![&b"a"[..], b"bb", b"ccc", b"ddd"]);
    }

    #[test]
    fn manifest() {
        let manifest = parse_manifest(r#"[{"name": "words", "files": ["a.txt", "b.txt"]}]"#).unwrap();
        assert_eq!(
            manifest,
            vec![ManifestItem {
                name: "words".to_string(),
                files: vec!["a.txt".to_string(), "b.txt".to_string()],
            }]
        );
        assert!(parse_manifest("{}").is_err());
    }
}
