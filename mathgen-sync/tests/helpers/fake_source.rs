//! Scripted record source
//!
//! Serves `RawNode`s from memory, counts every fetch per identifier and can
//! be told to fail the next N fetches of an identifier.

use async_trait::async_trait;
use mathgen_sync::types::ADVISOR_SENTINEL;
use mathgen_sync::{FetchError, PersonId, RawNode, RecordSource, SearchOutcome};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeSource {
    nodes: Mutex<HashMap<PersonId, RawNode>>,
    searches: Mutex<HashMap<String, SearchOutcome>>,
    failures: Mutex<HashMap<PersonId, VecDeque<FetchError>>>,
    fetch_counts: Mutex<HashMap<PersonId, usize>>,
    search_count: Mutex<usize>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = RawNode>) -> Self {
        let source = Self::new();
        for node in nodes {
            source.put_node(node);
        }
        source
    }

    /// Add or replace a remote record
    pub fn put_node(&self, node: RawNode) {
        self.nodes.lock().unwrap().insert(node.id, node);
    }

    /// Edit a remote record in place
    pub fn edit_node(&self, id: PersonId, edit: impl FnOnce(&mut RawNode)) {
        let mut nodes = self.nodes.lock().unwrap();
        edit(nodes.get_mut(&id).expect("node exists"));
    }

    pub fn put_search(&self, last_name: &str, outcome: SearchOutcome) {
        self.searches
            .lock()
            .unwrap()
            .insert(last_name.to_string(), outcome);
    }

    /// Fail the next `times` fetches of `id` with `error`
    pub fn fail_next(&self, id: PersonId, error: FetchError, times: usize) {
        let mut failures = self.failures.lock().unwrap();
        let queue = failures.entry(id).or_default();
        for _ in 0..times {
            queue.push_back(error.clone());
        }
    }

    pub fn fetch_count(&self, id: PersonId) -> usize {
        self.fetch_counts
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetch_counts.lock().unwrap().values().sum()
    }

    pub fn search_count(&self) -> usize {
        *self.search_count.lock().unwrap()
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch(&self, id: PersonId) -> Result<RawNode, FetchError> {
        *self.fetch_counts.lock().unwrap().entry(id).or_default() += 1;

        if let Some(error) = self
            .failures
            .lock()
            .unwrap()
            .get_mut(&id)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        self.nodes
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(FetchError::NotFound(id))
    }

    async fn search(&self, last_name: &str) -> Result<SearchOutcome, FetchError> {
        *self.search_count.lock().unwrap() += 1;

        Ok(self
            .searches
            .lock()
            .unwrap()
            .get(last_name)
            .cloned()
            .unwrap_or(SearchOutcome::Candidates(Vec::new())))
    }
}

/// Builds a consistent remote graph from advisor lists
///
/// Every person gets one dissertation per advisor group. Student sets and
/// remote descendant counts are derived from the advisor lists.
#[derive(Default)]
pub struct GraphBuilder {
    advisor_sequences: BTreeMap<PersonId, Vec<PersonId>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a person with a sentinel-separated advisor sequence
    pub fn person(mut self, id: PersonId, advisor_sequence: &[PersonId]) -> Self {
        self.advisor_sequences.insert(id, advisor_sequence.to_vec());
        self
    }

    pub fn build(&self) -> Vec<RawNode> {
        let mut students: BTreeMap<PersonId, BTreeSet<PersonId>> = BTreeMap::new();
        for (student, sequence) in &self.advisor_sequences {
            for advisor in sequence.iter().filter(|a| **a != ADVISOR_SENTINEL) {
                students.entry(*advisor).or_default().insert(*student);
            }
        }

        self.advisor_sequences
            .iter()
            .map(|(id, sequence)| {
                let groups = sequence.iter().filter(|a| **a == ADVISOR_SENTINEL).count() + 1;
                let direct = students.get(id).cloned().unwrap_or_default();
                let online_descendants = count_descendants(&students, *id, &direct);

                RawNode {
                    id: *id,
                    name: format!("Person {}", id),
                    universities: (1..=groups).map(|k| Some(format!("University {}.{}", id, k))).collect(),
                    years: (1..=groups).map(|k| Some(1900 + k as i32)).collect(),
                    titles: (1..=groups).map(|k| Some(format!("Thesis {}.{}", id, k))).collect(),
                    advisor_sequence: sequence.clone(),
                    students: direct,
                    online_descendants,
                }
            })
            .collect()
    }

    pub fn source(&self) -> FakeSource {
        FakeSource::from_nodes(self.build())
    }
}

fn count_descendants(
    students: &BTreeMap<PersonId, BTreeSet<PersonId>>,
    origin: PersonId,
    direct: &BTreeSet<PersonId>,
) -> u32 {
    let mut seen: BTreeSet<PersonId> = BTreeSet::from([origin]);
    let mut frontier: Vec<PersonId> = Vec::new();
    for id in direct {
        if seen.insert(*id) {
            frontier.push(*id);
        }
    }
    while let Some(id) = frontier.pop() {
        for student in students.get(&id).into_iter().flatten() {
            if seen.insert(*student) {
                frontier.push(*student);
            }
        }
    }
    (seen.len() - 1) as u32
}
