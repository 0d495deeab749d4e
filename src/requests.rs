use crate::error::DuelError;
use crate::types::*;
use std::collections::VecDeque;

/// Direct challenges waiting for an answer
#[derive(Debug, Default)]
pub struct RequestBook {
    requests: Vec<DuelRequest>,
}

impl RequestBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a request; at most one per (requester, target) pair
    pub fn insert(&mut self, request: DuelRequest) -> Result<(), DuelError> {
        if self.contains(&request.requester, &request.target) {
            return Err(DuelError::DuplicateRequest(request.target));
        }
        self.requests.push(request);
        Ok(())
    }

    pub fn contains(&self, requester: &ParticipantId, target: &ParticipantId) -> bool {
        self.requests
            .iter()
            .any(|r| &r.requester == requester && &r.target == target)
    }

    /// Remove and return the request from `requester` to `target`
    pub fn take(&mut self, requester: &ParticipantId, target: &ParticipantId) -> Option<DuelRequest> {
        let idx = self
            .requests
            .iter()
            .position(|r| &r.requester == requester && &r.target == target)?;
        Some(self.requests.remove(idx))
    }

    /// Requests addressed to `target`, oldest first
    pub fn incoming(&self, target: &ParticipantId) -> Vec<&DuelRequest> {
        self.requests.iter().filter(|r| &r.target == target).collect()
    }

    /// Drop requests older than `timeout_ms` and return them
    pub fn expire(&mut self, now_ms: u64, timeout_ms: u64) -> Vec<DuelRequest> {
        let (expired, kept): (Vec<_>, Vec<_>) = self
            .requests
            .drain(..)
            .partition(|r| now_ms.saturating_sub(r.timestamp_ms) > timeout_ms);
        self.requests = kept;
        expired
    }

    /// Drop every request `participant` is party to
    pub fn drop_involving(&mut self, participant: &ParticipantId) -> Vec<DuelRequest> {
        let (dropped, kept): (Vec<_>, Vec<_>) = self
            .requests
            .drain(..)
            .partition(|r| &r.requester == participant || &r.target == participant);
        self.requests = kept;
        dropped
    }

    pub fn all(&self) -> &[DuelRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// FIFO of participants waiting for an automatic opponent
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    entries: VecDeque<ParticipantId>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, participant: ParticipantId) -> Result<(), DuelError> {
        if self.contains(&participant) {
            return Err(DuelError::AlreadyQueued);
        }
        self.entries.push_back(participant);
        Ok(())
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.entries.contains(participant)
    }

    pub fn remove(&mut self, participant: &ParticipantId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|p| p != participant);
        before != self.entries.len()
    }

    /// Pop the two longest-waiting entries
    pub fn pop_pair(&mut self) -> Option<(ParticipantId, ParticipantId)> {
        if self.entries.len() < 2 {
            return None;
        }
        let first = self.entries.pop_front()?;
        let second = self.entries.pop_front()?;
        Some((first, second))
    }

    /// Put a popped pair back at the front, preserving their order
    pub fn restore_pair(&mut self, first: ParticipantId, second: ParticipantId) {
        self.entries.push_front(second);
        self.entries.push_front(first);
    }

    pub fn restore_front(&mut self, participant: ParticipantId) {
        self.entries.push_front(participant);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticipantId> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(a: &str, b: &str, at: u64) -> DuelRequest {
        DuelRequest {
            requester: ParticipantId::new(a),
            target: ParticipantId::new(b),
            map_name: None,
            timestamp_ms: at,
        }
    }

    #[test]
    fn test_one_request_per_pair() {
        let mut book = RequestBook::new();
        book.insert(request("a", "b", 0)).unwrap();
        assert!(book.insert(request("a", "b", 5)).is_err());
        book.insert(request("b", "a", 5)).unwrap();
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_expire_drops_only_old_requests() {
        let mut book = RequestBook::new();
        book.insert(request("a", "b", 0)).unwrap();
        book.insert(request("c", "b", 30_000)).unwrap();

        assert!(book.expire(60_000, 60_000).is_empty());
        let expired = book.expire(60_001, 60_000);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].requester.as_str(), "a");
        assert!(book.take(&ParticipantId::new("a"), &ParticipantId::new("b")).is_none());
        assert_eq!(book.incoming(&ParticipantId::new("b")).len(), 1);
    }

    #[test]
    fn test_drop_involving() {
        let mut book = RequestBook::new();
        book.insert(request("a", "b", 0)).unwrap();
        book.insert(request("c", "a", 0)).unwrap();
        book.insert(request("c", "b", 0)).unwrap();
        assert_eq!(book.drop_involving(&ParticipantId::new("a")).len(), 2);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_queue_pairs_in_order() {
        let mut queue = MatchmakingQueue::new();
        for p in ["a", "b", "c"] {
            queue.enqueue(ParticipantId::new(p)).unwrap();
        }
        assert!(queue.enqueue(ParticipantId::new("a")).is_err());

        let (first, second) = queue.pop_pair().unwrap();
        assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
        assert!(queue.pop_pair().is_none());

        queue.restore_pair(first, second);
        let order: Vec<_> = queue.iter().map(|p| p.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_restore_front_jumps_the_queue() {
        let mut queue = MatchmakingQueue::new();
        for p in ["a", "b", "c"] {
            queue.enqueue(ParticipantId::new(p)).unwrap();
        }
        let (first, _) = queue.pop_pair().unwrap();
        queue.restore_front(first);
        let order: Vec<_> = queue.iter().map(|p| p.as_str()).collect();
        assert_eq!(order, vec!["a", "c"]);
    }
}
