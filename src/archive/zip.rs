//! ZIP backend

use std::io::Read;

use zip::result::ZipError;

use super::{normalize_member_path, ArchiveCodec, ByteSource, Member, ReadSeek};
use crate::errors::{BrowseError, BrowseResult};

pub struct ZipCodec {
    source: ByteSource,
    password: Option<String>,
    label: String,
}

impl ZipCodec {
    pub fn new(source: ByteSource, password: Option<&str>, label: &str) -> Self {
        Self {
            source,
            password: password.map(|p| p.to_string()),
            label: label.to_string(),
        }
    }

    fn archive(&self) -> BrowseResult<zip::ZipArchive<Box<dyn ReadSeek + '_>>> {
        let raw = self
            .source
            .open()
            .map_err(|e| BrowseError::from_io(e, &self.label))?;
        zip::ZipArchive::new(raw).map_err(|e| self.classify(e))
    }

    fn classify(&self, err: ZipError) -> BrowseError {
        match err {
            ZipError::InvalidPassword => BrowseError::PasswordRequired {
                archive: self.label.clone(),
            },
            ZipError::UnsupportedArchive(msg) => {
                if msg.contains("password") || msg.contains("encrypted") {
                    BrowseError::PasswordRequired {
                        archive: self.label.clone(),
                    }
                } else {
                    BrowseError::UnsupportedFormat(self.label.clone(), msg.to_string())
                }
            }
            ZipError::FileNotFound => BrowseError::MemberNotFound {
                archive: self.label.clone(),
                member: String::new(),
            },
            other => BrowseError::UnreadableArchive(self.label.clone(), format!("{other}")),
        }
    }
}

impl ArchiveCodec for ZipCodec {
    fn read_index(&mut self) -> BrowseResult<Vec<Member>> {
        let mut archive = self.archive()?;
        let mut members = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let looked_up = match &self.password {
                Some(pw) => archive.by_index_decrypt(i, pw.as_bytes()),
                None => archive.by_index(i),
            };
            let entry = looked_up.map_err(|e| self.classify(e))?;

            members.push(Member {
                path: normalize_member_path(entry.name()),
                size: entry.size(),
                is_dir: entry.is_dir(),
            });
        }

        Ok(members)
    }

    fn extract(&mut self, member: &str) -> BrowseResult<Vec<u8>> {
        let mut archive = self.archive()?;

        let looked_up = match &self.password {
            Some(pw) => archive.by_name_decrypt(member, pw.as_bytes()),
            None => archive.by_name(member),
        };
        let mut entry = looked_up.map_err(|e| match e {
            ZipError::FileNotFound => BrowseError::MemberNotFound {
                archive: self.label.clone(),
                member: member.to_string(),
            },
            other => self.classify(other),
        })?;

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| BrowseError::UnreadableArchive(self.label.clone(), format!("{e}")))?;

        Ok(contents)
    }
}
