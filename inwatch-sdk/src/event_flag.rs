#![allow(non_upper_case_globals)]
use bitflags::bitflags;
bitflags! {
    /// Raw inotify mask, as requested on a watch or reported on a record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const Access = libc::IN_ACCESS;
        const Modify = libc::IN_MODIFY;
        const Attrib = libc::IN_ATTRIB;
        const CloseWrite = libc::IN_CLOSE_WRITE;
        const CloseNoWrite = libc::IN_CLOSE_NOWRITE;
        const Open = libc::IN_OPEN;
        const MovedFrom = libc::IN_MOVED_FROM;
        const MovedTo = libc::IN_MOVED_TO;
        const Create = libc::IN_CREATE;
        const Delete = libc::IN_DELETE;
        const DeleteSelf = libc::IN_DELETE_SELF;
        const MoveSelf = libc::IN_MOVE_SELF;
        const Unmount = libc::IN_UNMOUNT;
        const QueueOverflow = libc::IN_Q_OVERFLOW;
        const Ignored = libc::IN_IGNORED;
        const IsDir = libc::IN_ISDIR;
    }
}

impl EventMask {
    /// Every bit the classifier turns into a notification.
    pub const RECOGNIZED: EventMask = EventMask::Create
        .union(EventMask::Delete)
        .union(EventMask::Modify)
        .union(EventMask::Attrib)
        .union(EventMask::Open)
        .union(EventMask::Access)
        .union(EventMask::CloseWrite)
        .union(EventMask::CloseNoWrite);

    /// Mask requested for every watched path unless configured otherwise.
    pub const DEFAULT_WATCH: EventMask = EventMask::RECOGNIZED.union(EventMask::IsDir);

    pub fn is_dir(&self) -> bool {
        self.contains(EventMask::IsDir)
    }
}

/// Semantic action of a change record.
///
/// Declaration order is the classification precedence: when a mask carries
/// several action bits, the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Created,
    Deleted,
    Modified,
    AttributeChanged,
    Opened,
    Accessed,
    ClosedWithWrite,
    ClosedWithoutWrite,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Created,
        EventKind::Deleted,
        EventKind::Modified,
        EventKind::AttributeChanged,
        EventKind::Opened,
        EventKind::Accessed,
        EventKind::ClosedWithWrite,
        EventKind::ClosedWithoutWrite,
    ];

    /// The inotify bit that reports this action.
    pub fn mask(self) -> EventMask {
        match self {
            EventKind::Created => EventMask::Create,
            EventKind::Deleted => EventMask::Delete,
            EventKind::Modified => EventMask::Modify,
            EventKind::AttributeChanged => EventMask::Attrib,
            EventKind::Opened => EventMask::Open,
            EventKind::Accessed => EventMask::Access,
            EventKind::ClosedWithWrite => EventMask::CloseWrite,
            EventKind::ClosedWithoutWrite => EventMask::CloseNoWrite,
        }
    }

    /// Past-tense text used after "was" when rendering.
    pub fn action(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Deleted => "deleted",
            EventKind::Modified => "modified",
            EventKind::AttributeChanged => "changed (metadata)",
            EventKind::Opened => "opened",
            EventKind::Accessed => "accessed",
            EventKind::ClosedWithWrite => "closed with write",
            EventKind::ClosedWithoutWrite => "closed without write",
        }
    }
}

impl TryFrom<EventMask> for EventKind {
    type Error = EventMask;
    fn try_from(mask: EventMask) -> Result<Self, EventMask> {
        EventKind::ALL
            .into_iter()
            .find(|kind| mask.contains(kind.mask()))
            .ok_or(mask)
    }
}
