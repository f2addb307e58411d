//! Read access to the members of an OOXML (ZIP) container.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::PartFailure;

/// Members larger than this are skipped rather than inflated.
const MAX_MEMBER_BYTES: u64 = 64 * 1024 * 1024;

pub struct OoxmlArchive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
    names: Vec<String>,
}

impl<'a> OoxmlArchive<'a> {
    pub fn open(bytes: &'a [u8]) -> zip::result::ZipResult<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut names: Vec<String> = zip.file_names().map(|n| n.to_string()).collect();
        names.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));
        Ok(Self { zip, names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Member names under `prefix` ending in `suffix`, in natural order
    /// (`slide2.xml` before `slide10.xml`).
    pub fn members(&self, prefix: &str, suffix: &str) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| n.starts_with(prefix) && n.ends_with(suffix))
            // direct children only
            .filter(|n| !n[prefix.len()..].contains('/'))
            .cloned()
            .collect()
    }

    pub fn read_bytes(&mut self, name: &str) -> Result<Vec<u8>, PartFailure> {
        let mut file = self
            .zip
            .by_name(name)
            .map_err(|e| PartFailure::new(name, e))?;
        if file.size() > MAX_MEMBER_BYTES {
            return Err(PartFailure::new(name, format!("member too large ({} bytes)", file.size())));
        }
        let mut buffer = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buffer)
            .map_err(|e| PartFailure::new(name, e))?;
        Ok(buffer)
    }

    pub fn read_xml(&mut self, name: &str) -> Result<String, PartFailure> {
        let bytes = self.read_bytes(name)?;
        String::from_utf8(bytes).map_err(|e| PartFailure::new(name, e))
    }
}

/// Sort key splitting the trailing number out of a member's file stem.
pub fn natural_key(name: &str) -> (String, u64, String) {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > name.rfind('/').map_or(0, |s| s + 1) => name.split_at(dot),
        _ => (name, ""),
    };
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    match digits_start {
        Some(i) => {
            let number = stem[i..].parse().unwrap_or(u64::MAX);
            (stem[..i].to_string(), number, extension.to_string())
        }
        None => (stem.to_string(), 0, extension.to_string()),
    }
}

/// The trailing number of a member's file stem, e.g. 3 for `slide3.xml`.
pub fn part_number(name: &str) -> Option<u64> {
    let (_, number, _) = natural_key(name);
    let stem = name.rsplit('/').next().unwrap_or(name);
    stem.chars().any(|c| c.is_ascii_digit()).then_some(number)
}

pub fn file_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
