//! The three-phase ballot protocol: Prepare, Confirm, Externalize.
//! Grounded on `consensus/ballot_state.go`.

use std::collections::HashMap;

use fbc_common::log_debug;
use fbc_consensus_scp_types::{
    Ballot, BallotMessage, ConfirmMessage, ExternalizeMessage, Phase, PrepareMessage, QuorumSlice,
    SlotValue,
};

use crate::quorum::{meets_quorum, QuorumFinder};

struct PeerSlices<'a> {
    self_id: &'a str,
    slices: &'a HashMap<String, QuorumSlice>,
}

impl<'a> QuorumFinder for PeerSlices<'a> {
    fn quorum_slice(&self, node_id: &str) -> Option<QuorumSlice> {
        self.slices.get(node_id).cloned()
    }
    fn self_id(&self) -> &str {
        self.self_id
    }
}

/// How many consecutive messages from a quorum must look "behind" us
/// before we treat the quorum as stale and force a ballot bump.
const STALE_THRESHOLD: usize = 3;

/// Federated-voting state for the ballot protocol on a single slot.
pub struct BallotState {
    self_id: String,
    quorum_slice: QuorumSlice,

    pub phase: Phase,
    /// The ballot this node is currently voting to prepare. `None` until
    /// the first `go_to_next_ballot`.
    pub b: Option<Ballot>,
    /// The two highest confirmed-incompatible accepted-prepared ballots,
    /// with `p` the higher. Zero when nothing has been accepted yet.
    pub p: Ballot,
    pub pp: Ballot,
    /// The commit range this node is voting for (0 means "not voting to
    /// commit").
    pub c: u32,
    pub h: u32,
    /// The fallback value to use on the next ballot, once one has been
    /// confirmed prepared.
    pub z: SlotValue,

    peers: HashMap<String, BallotMessage>,
    peer_slices: HashMap<String, QuorumSlice>,
    stale_count: usize,
}

impl BallotState {
    pub fn new(self_id: String, quorum_slice: QuorumSlice) -> Self {
        let mut peer_slices = HashMap::new();
        peer_slices.insert(self_id.clone(), quorum_slice.clone());
        BallotState {
            self_id,
            quorum_slice,
            phase: Phase::Prepare,
            b: None,
            p: Ballot::zero(),
            pp: Ballot::zero(),
            c: 0,
            h: 0,
            z: SlotValue::empty(),
            peers: HashMap::new(),
            peer_slices,
            stale_count: 0,
        }
    }

    pub fn quorum_slice(&self) -> &QuorumSlice {
        &self.quorum_slice
    }

    fn finder(&self) -> PeerSlices<'_> {
        PeerSlices {
            self_id: &self.self_id,
            slices: &self.peer_slices,
        }
    }

    fn self_votes_to_prepare(&self, n: u32, x: &SlotValue) -> bool {
        matches!(&self.b, Some(b) if &b.x == x && b.n >= n)
    }

    fn self_accepts_prepared(&self, n: u32, x: &SlotValue) -> bool {
        (self.p.n >= n && &self.p.x == x) || (self.pp.n >= n && &self.pp.x == x)
    }

    fn nodes_voting_or_accepting_prepared(&self, n: u32, x: &SlotValue) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| m.vote_to_prepare(n, x) || m.accept_as_prepared(n, x))
            .map(|(id, _)| id.clone())
            .collect();
        if self.self_votes_to_prepare(n, x) || self.self_accepts_prepared(n, x) {
            nodes.push(self.self_id.clone());
        }
        nodes
    }

    fn nodes_accepting_prepared(&self, n: u32, x: &SlotValue) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| m.accept_as_prepared(n, x))
            .map(|(id, _)| id.clone())
            .collect();
        if self.self_accepts_prepared(n, x) {
            nodes.push(self.self_id.clone());
        }
        nodes
    }

    fn nodes_voting_or_accepting_committed(&self, n: u32, x: &SlotValue) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| m.vote_to_commit(n, x) || m.accept_as_committed(n, x))
            .map(|(id, _)| id.clone())
            .collect();
        if self.c != 0 && self.c <= n && n <= self.h {
            if let Some(b) = &self.b {
                if &b.x == x {
                    nodes.push(self.self_id.clone());
                }
            }
        }
        nodes
    }

    fn nodes_accepting_committed(&self, n: u32, x: &SlotValue) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| m.accept_as_committed(n, x))
            .map(|(id, _)| id.clone())
            .collect();
        if self.phase != Phase::Prepare && self.c != 0 && self.c <= n && n <= self.h {
            nodes.push(self.self_id.clone());
        }
        nodes
    }

    fn federated_accept(&self, voted_or_accepted: &[String], accepted: &[String]) -> bool {
        meets_quorum(&self.finder(), voted_or_accepted) || self.quorum_slice.blocked_by(accepted)
    }

    fn update_prepared(&mut self, n: u32, x: &SlotValue) {
        let candidate = Ballot::new(n, x.clone());
        if candidate.compatible(&self.p) {
            if candidate > self.p {
                self.p = candidate;
            }
            return;
        }
        if candidate.compatible(&self.pp) {
            if candidate > self.pp {
                if candidate > self.p {
                    self.pp = self.p.clone();
                    self.p = candidate;
                } else {
                    self.pp = candidate;
                }
            }
            return;
        }
        if candidate > self.p {
            self.pp = self.p.clone();
            self.p = candidate;
        } else if candidate > self.pp {
            self.pp = candidate;
        }
    }

    /// If a quorum (or blocking set) votes-or-accepts ballot `(n, x)` as
    /// prepared, accepts it: updates `p`/`p'`, and aborts any in-progress
    /// vote to commit an incompatible value.
    pub fn maybe_accept_as_prepared(&mut self, n: u32, x: &SlotValue) -> bool {
        if self.phase == Phase::Externalize {
            return false;
        }
        let voted_or_accepted = self.nodes_voting_or_accepting_prepared(n, x);
        let accepted = self.nodes_accepting_prepared(n, x);
        if !self.federated_accept(&voted_or_accepted, &accepted) {
            return false;
        }
        self.update_prepared(n, x);
        if self.c != 0 {
            let candidate = Ballot::new(n, x.clone());
            let committed_compatible = self
                .b
                .as_ref()
                .map(|b| b.compatible(&candidate))
                .unwrap_or(true);
            if !committed_compatible {
                self.c = 0;
            }
        }
        true
    }

    /// If a quorum accepts `(n, x)` as prepared, confirms it: this becomes
    /// the fallback value for future ballots, and may open a vote to
    /// commit.
    pub fn maybe_confirm_as_prepared(&mut self, n: u32, x: &SlotValue) -> bool {
        if self.phase == Phase::Externalize {
            return false;
        }
        let accepted = self.nodes_accepting_prepared(n, x);
        if !meets_quorum(&self.finder(), &accepted) {
            return false;
        }
        self.z = x.clone();
        if n > self.h {
            self.h = n;
        }
        if self.c == 0 {
            if let Some(b) = &self.b {
                if &b.x == x && b.n >= n {
                    self.c = b.n;
                }
            }
        }
        true
    }

    /// If a quorum (or blocking set) votes-or-accepts `(n, x)` as
    /// committed, moves to `Confirm` and widens the commit range.
    pub fn maybe_accept_as_committed(&mut self, n: u32, x: &SlotValue) -> bool {
        if self.phase == Phase::Externalize {
            return false;
        }
        let voted_or_accepted = self.nodes_voting_or_accepting_committed(n, x);
        let accepted = self.nodes_accepting_committed(n, x);
        if !self.federated_accept(&voted_or_accepted, &accepted) {
            return false;
        }
        self.phase = Phase::Confirm;
        if self.c == 0 || n < self.c {
            self.c = n;
        }
        if n > self.h {
            self.h = n;
        }
        self.z = x.clone();
        true
    }

    /// If a quorum accepts `(n, x)` as committed, confirms externalization.
    pub fn maybe_confirm_as_committed(&mut self, n: u32, x: &SlotValue) -> bool {
        if self.phase < Phase::Confirm {
            return false;
        }
        let accepted = self.nodes_accepting_committed(n, x);
        if !meets_quorum(&self.finder(), &accepted) {
            return false;
        }
        self.phase = Phase::Externalize;
        self.z = x.clone();
        if n > self.h {
            self.h = n;
        }
        if self.c == 0 || n < self.c {
            self.c = n;
        }
        true
    }

    /// Runs all four `maybe_*` checks for `(n, x)`.
    pub fn investigate_ballot(&mut self, n: u32, x: &SlotValue) {
        self.maybe_accept_as_prepared(n, x);
        self.maybe_confirm_as_prepared(n, x);
        self.maybe_accept_as_committed(n, x);
        self.maybe_confirm_as_committed(n, x);
    }

    /// Moves to the next ballot: counter `b.n + 1`, value `z` if a value
    /// has been confirmed prepared, else `predicted`. If a commit vote was
    /// already open and remains compatible, keeps voting for it.
    pub fn go_to_next_ballot(&mut self, predicted: SlotValue) {
        if self.phase == Phase::Externalize {
            return;
        }
        let next_n = self.b.as_ref().map(|b| b.n + 1).unwrap_or(1);
        let value = if !self.z.is_empty() { self.z.clone() } else { predicted };
        self.b = Some(Ballot::new(next_n, value));
        log_debug!(fbc_common::Logger, "moved to ballot n={next_n}");
    }

    /// Bumps the ballot if enough peers could never vote for the current
    /// one that it is doomed to fail.
    pub fn check_for_blocked_ballot(&mut self, predicted: SlotValue) -> bool {
        let Some(b) = self.b.clone() else {
            return false;
        };
        let blockers: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| !m.could_ever_vote_for(b.n, &b.x))
            .map(|(id, _)| id.clone())
            .collect();
        if self.quorum_slice.blocked_by(&blockers) {
            self.go_to_next_ballot(predicted);
            true
        } else {
            false
        }
    }

    /// Bumps the ballot if the quorum appears to be ahead of us and we are
    /// not the blocker holding it back.
    pub fn handle_stale_quorum(&mut self, predicted: SlotValue) {
        let behind: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| m.ballot_number() <= self.b.as_ref().map(|b| b.n).unwrap_or(0))
            .map(|(id, _)| id.clone())
            .collect();
        if !self.quorum_slice.blocked_by(&behind) {
            self.go_to_next_ballot(predicted);
        }
        self.stale_count = 0;
    }

    fn check_if_stale(&mut self, predicted: SlotValue) {
        if self.stale_count >= STALE_THRESHOLD {
            self.handle_stale_quorum(predicted);
        }
    }

    pub fn has_message(&self, sender: &str) -> bool {
        self.peers.contains_key(sender)
    }

    /// Processes a ballot message from `sender`: records its quorum slice,
    /// detects staleness (a message whose ballot number doesn't move us
    /// forward), investigates the candidate values it mentions, then bumps
    /// the ballot as long as doing so is forced.
    pub fn handle(&mut self, sender: &str, message: BallotMessage, predicted: SlotValue) {
        self.peer_slices
            .insert(sender.to_string(), message.quorum_slice().clone());

        let is_stale = self
            .peers
            .get(sender)
            .map(|prev| message.ballot_number() <= prev.ballot_number())
            .unwrap_or(false);
        if is_stale {
            self.stale_count += 1;
        } else {
            self.stale_count = 0;
        }

        let candidate_values = self.candidate_values(&message);
        self.peers.insert(sender.to_string(), message);

        let max_actionable = self.max_actionable_ballot_number();
        for x in candidate_values {
            let (low, high) = self.relevant_range(&x);
            let low = low.max(1);
            let high = high.min(max_actionable);
            let mut n = low;
            while n <= high {
                self.investigate_ballot(n, &x);
                n += 1;
            }
            if let Some(b) = &self.b {
                if n <= b.n {
                    self.investigate_ballot(b.n, &x);
                }
            }
        }

        while self.check_for_blocked_ballot(predicted.clone()) {}
        self.check_if_stale(predicted);
    }

    /// The highest ballot number a v-blocking set of peers is talking
    /// about, used to cap how far `investigate_ballot` will ever range
    /// over a single candidate value. Without this, a peer's own `hn`
    /// (attacker-controlled on `Confirm`/`Externalize`) bounds the loop.
    fn max_actionable_ballot_number(&self) -> u32 {
        let mut number_to_nodes: HashMap<u32, Vec<String>> = HashMap::new();
        for (node, message) in &self.peers {
            number_to_nodes.entry(message.max_n()).or_default().push(node.clone());
        }

        let mut ns: Vec<u32> = number_to_nodes.keys().copied().collect();
        ns.sort_unstable_by(|a, b| b.cmp(a));

        let mut nodes_above: Vec<String> = Vec::new();
        for n in ns {
            if let Some(nodes) = number_to_nodes.remove(&n) {
                nodes_above.extend(nodes);
            }
            if self.quorum_slice.blocked_by(&nodes_above) {
                return n;
            }
        }
        0
    }

    fn candidate_values(&self, message: &BallotMessage) -> Vec<SlotValue> {
        let mut values = vec![message_value(message)];
        if let BallotMessage::Prepare(m) = message {
            values.push(m.px.clone());
            values.push(m.ppx.clone());
        }
        if let Some(b) = &self.b {
            values.push(b.x.clone());
        }
        values.sort();
        values.dedup();
        values
    }

    fn relevant_range(&self, x: &SlotValue) -> (u32, u32) {
        let mut range = (0u32, 0u32);
        for m in self.peers.values() {
            let (lo, hi) = m.relevant_range(x);
            range = fbc_consensus_scp_types::range_union(range.0, range.1, lo, hi);
        }
        if range == (0, 0) {
            (1, 1)
        } else {
            range
        }
    }

    pub fn assert_valid(&self) {
        assert!(self.c <= self.h, "commit range invariant violated: c > h");
        assert!(
            self.p.is_zero() || self.pp.is_zero() || !self.p.compatible(&self.pp),
            "p and p' must be incompatible"
        );
        if let Some(b) = &self.b {
            assert!(self.c == 0 || self.c <= b.n, "commit counter ahead of current ballot");
        }
    }

    /// Builds the outgoing message for the current phase.
    pub fn message(&self, slot: u64) -> Option<BallotMessage> {
        let b = self.b.as_ref()?;
        Some(match self.phase {
            Phase::Prepare => BallotMessage::Prepare(PrepareMessage {
                slot,
                bn: b.n,
                bx: b.x.clone(),
                pn: self.p.n,
                px: self.p.x.clone(),
                ppn: self.pp.n,
                ppx: self.pp.x.clone(),
                cn: self.c,
                hn: self.h,
                quorum_slice: self.quorum_slice.clone(),
            }),
            Phase::Confirm => BallotMessage::Confirm(ConfirmMessage {
                slot,
                x: self.z.clone(),
                pn: self.p.n,
                cn: self.c,
                hn: self.h,
                quorum_slice: self.quorum_slice.clone(),
            }),
            Phase::Externalize => BallotMessage::Externalize(ExternalizeMessage {
                slot,
                x: self.z.clone(),
                cn: self.c,
                hn: self.h,
                quorum_slice: self.quorum_slice.clone(),
            }),
        })
    }
}

fn message_value(message: &BallotMessage) -> SlotValue {
    match message {
        BallotMessage::Prepare(m) => m.bx.clone(),
        BallotMessage::Confirm(m) => m.x.clone(),
        BallotMessage::Externalize(m) => m.x.clone(),
    }
}
