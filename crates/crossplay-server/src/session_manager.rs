use crate::session::Session;
use crossplay_common::SessionId;
use std::collections::HashMap;

/// Registry of open sessions. It is the only owner of `Session` values; the
/// username index is a lookup view kept in step with it.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<SessionId, Session>,
    usernames: HashMap<String, SessionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `session` unless its id is already live.
    pub fn add_session(&mut self, session: Session) -> bool {
        if self.sessions.contains_key(&session.id) {
            return false;
        }
        if let Some(username) = &session.username {
            self.usernames.insert(username.clone(), session.id);
        }
        self.sessions.insert(session.id, session);
        true
    }

    pub fn remove_session(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        if let Some(username) = &session.username {
            if self.usernames.get(username) == Some(&id) {
                self.usernames.remove(username);
            }
        }
        Some(session)
    }

    pub fn get_session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Records the username announced by login start.
    pub fn set_username(&mut self, id: SessionId, username: &str) -> bool {
        let session = match self.sessions.get_mut(&id) {
            Some(session) => session,
            None => return false,
        };
        if let Some(previous) = session.username.replace(username.to_string()) {
            if self.usernames.get(&previous) == Some(&id) {
                self.usernames.remove(&previous);
            }
        }
        self.usernames.insert(username.to_string(), id);
        true
    }

    pub fn find_by_username(&self, username: &str) -> Option<&Session> {
        self.usernames
            .get(username)
            .and_then(|id| self.sessions.get(id))
    }

    /// Ids of every open session, in ascending order.
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: i32) -> Session {
        Session::new(SessionId(id), "127.0.0.1".to_string(), 40000 + id as u16)
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut manager = SessionManager::new();
        assert!(manager.add_session(session(7)));
        assert!(!manager.add_session(session(7)));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_username_index_follows_registry() {
        let mut manager = SessionManager::new();
        manager.add_session(session(1));
        manager.add_session(session(2));
        assert!(manager.set_username(SessionId(1), "Steve"));
        assert!(!manager.set_username(SessionId(9), "Ghost"));

        assert_eq!(manager.find_by_username("Steve").map(|s| s.id), Some(SessionId(1)));

        manager.remove_session(SessionId(1));
        assert!(manager.find_by_username("Steve").is_none());
        assert_eq!(manager.ids(), vec![SessionId(2)]);
    }

    #[test]
    fn test_rename_drops_old_name() {
        let mut manager = SessionManager::new();
        manager.add_session(session(3));
        manager.set_username(SessionId(3), "Alex");
        manager.set_username(SessionId(3), "Alexa");
        assert!(manager.find_by_username("Alex").is_none());
        assert!(manager.find_by_username("Alexa").is_some());
    }
}
