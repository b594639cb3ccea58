use crate::{EventKind, RawChangeRecord};
use std::fmt;

/// Shown in place of the name for events on the watched path itself.
pub const UNKNOWN_NAME: &str = "[Unknown]";

/// A classified change, ready to be rendered as one output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: EventKind,
    pub is_dir: bool,
    pub name: String,
}

impl Notification {
    /// Classifies a record, returning `None` when its mask carries none of the
    /// recognized action bits.
    pub fn classify(record: &RawChangeRecord<'_>) -> Option<Self> {
        let kind = EventKind::try_from(record.mask).ok()?;
        let name = record.name_bytes();
        let name = if name.is_empty() {
            UNKNOWN_NAME.to_string()
        } else {
            String::from_utf8_lossy(name).into_owned()
        };
        Some(Self {
            kind,
            is_dir: record.mask.is_dir(),
            name,
        })
    }

    pub fn entity(&self) -> &'static str {
        if self.is_dir { "Directory" } else { "File" }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} was {}.",
            self.entity(),
            self.name,
            self.kind.action()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EventMask, Records,
        record::{HEADER_SIZE, encode_record},
    };

    fn classify_one(mask: EventMask, name: &str) -> Option<Notification> {
        let buffer = encode_record(1, mask, 0, name);
        let record = Records::new(&buffer, buffer.len()).next().unwrap();
        Notification::classify(&record)
    }

    #[test]
    fn file_creation_renders() {
        let notification = classify_one(EventMask::Create, "a.txt").unwrap();
        assert_eq!(notification.kind, EventKind::Created);
        assert!(!notification.is_dir);
        assert_eq!(notification.to_string(), "File a.txt was created.");
    }

    #[test]
    fn directory_close_with_write_is_emitted() {
        let notification =
            classify_one(EventMask::CloseWrite | EventMask::IsDir, "build").unwrap();
        assert_eq!(
            notification.to_string(),
            "Directory build was closed with write."
        );
    }

    #[test]
    fn empty_name_falls_back_to_placeholder() {
        let notification = classify_one(EventMask::Modify, "").unwrap();
        assert_eq!(notification.name, UNKNOWN_NAME);
        assert_eq!(notification.to_string(), "File [Unknown] was modified.");
    }

    #[test]
    fn every_kind_has_its_action_text() {
        let rendered: Vec<_> = EventKind::ALL
            .into_iter()
            .map(|kind| classify_one(kind.mask(), "x").unwrap().to_string())
            .collect();
        assert_eq!(
            rendered,
            [
                "File x was created.",
                "File x was deleted.",
                "File x was modified.",
                "File x was changed (metadata).",
                "File x was opened.",
                "File x was accessed.",
                "File x was closed with write.",
                "File x was closed without write.",
            ]
        );
    }

    #[test]
    fn unrecognized_masks_are_skipped() {
        assert_eq!(classify_one(EventMask::Ignored, ""), None);
        assert_eq!(classify_one(EventMask::MovedTo | EventMask::IsDir, "d"), None);
    }

    #[test]
    fn non_utf8_names_are_rendered_lossily() {
        let mut buffer = encode_record(1, EventMask::Delete, 0, "ab");
        buffer[HEADER_SIZE + 1] = 0xff;
        let record = Records::new(&buffer, buffer.len()).next().unwrap();
        let notification = Notification::classify(&record).unwrap();
        assert_eq!(notification.to_string(), "File a\u{fffd} was deleted.");
    }
}
