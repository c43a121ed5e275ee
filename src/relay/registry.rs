use std::collections::{BTreeSet, HashMap};

use crate::relay::types::{RoomId, SessionId};

/// Tracks which sessions are in which room.
///
/// A session is in at most one room. Rooms exist only while they have members.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, BTreeSet<SessionId>>,
    room_of: HashMap<SessionId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `session` in `room` and return the sorted member list.
    ///
    /// Joining the room the session is already in changes nothing. Joining a
    /// different room first removes the session from the old one.
    pub fn join(&mut self, room: &str, session: &SessionId) -> Vec<SessionId> {
        if self.room_of.get(session).is_some_and(|r| r != room) {
            self.leave(session);
        }

        self.rooms
            .entry(room.to_owned())
            .or_default()
            .insert(session.clone());
        self.room_of.insert(session.clone(), room.to_owned());

        self.members_of(room)
    }

    /// Remove `session` from its room, dropping the room once empty.
    ///
    /// Returns the room and the members left behind, or `None` if the session
    /// was not in any room.
    pub fn leave(&mut self, session: &SessionId) -> Option<(RoomId, Vec<SessionId>)> {
        let room = self.room_of.remove(session)?;

        let remaining = match self.rooms.get_mut(&room) {
            Some(members) => {
                members.remove(session);
                members.iter().cloned().collect::<Vec<_>>()
            }
            None => Vec::new(),
        };

        if remaining.is_empty() {
            self.rooms.remove(&room);
        }

        Some((room, remaining))
    }

    /// Sorted snapshot of a room's members; empty for unknown rooms.
    pub fn members_of(&self, room: &str) -> Vec<SessionId> {
        self.rooms
            .get(room)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_of(&self, session: &SessionId) -> Option<&RoomId> {
        self.room_of.get(session)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_session(&self, session: &SessionId) -> bool {
        self.room_of.contains_key(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    #[test]
    fn join_is_idempotent() {
        let mut reg = RoomRegistry::new();
        let a = reg.join("abc", &sid("s1"));
        let b = reg.join("abc", &sid("s1"));
        assert_eq!(a, vec![sid("s1")]);
        assert_eq!(a, b);
        assert_eq!(reg.room_count(), 1);
    }

    #[test]
    fn members_come_back_sorted() {
        let mut reg = RoomRegistry::new();
        reg.join("abc", &sid("zz"));
        reg.join("abc", &sid("mm"));
        let members = reg.join("abc", &sid("aa"));
        assert_eq!(members, vec![sid("aa"), sid("mm"), sid("zz")]);
    }

    #[test]
    fn joining_another_room_moves_the_session() {
        let mut reg = RoomRegistry::new();
        reg.join("one", &sid("s1"));
        reg.join("one", &sid("s2"));
        reg.join("two", &sid("s1"));

        assert_eq!(reg.members_of("one"), vec![sid("s2")]);
        assert_eq!(reg.members_of("two"), vec![sid("s1")]);
        assert_eq!(reg.room_of(&sid("s1")).map(String::as_str), Some("two"));
    }

    #[test]
    fn last_leave_drops_the_room() {
        let mut reg = RoomRegistry::new();
        reg.join("abc", &sid("s1"));
        reg.join("abc", &sid("s2"));

        let (room, remaining) = reg.leave(&sid("s1")).unwrap_or_default();
        assert_eq!(room, "abc");
        assert_eq!(remaining, vec![sid("s2")]);

        let (_, remaining) = reg.leave(&sid("s2")).unwrap_or_default();
        assert!(remaining.is_empty());
        assert_eq!(reg.room_count(), 0);
        assert!(reg.members_of("abc").is_empty());
    }

    #[test]
    fn leave_without_join_is_harmless() {
        let mut reg = RoomRegistry::new();
        assert!(reg.leave(&sid("ghost")).is_none());
        assert!(!reg.contains_session(&sid("ghost")));
    }
}
