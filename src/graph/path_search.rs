use crate::core::participant::Participant;
use crate::graph::debt_graph::{AsyncDebtGraph, DebtGraph};
use futures::future::try_join_all;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

/// Participants of one snapshot, deduplicated, with the positions of the
/// search endpoints.
struct SearchSpace {
    order: Vec<Participant>,
    start: usize,
    end: usize,
}

impl SearchSpace {
    /// Returns `None` when either endpoint is not a known participant, in
    /// which case no path can exist.
    fn new(participants: Vec<Participant>, start: &Participant, end: &Participant) -> Option<Self> {
        let mut seen = HashSet::with_capacity(participants.len());
        let order: Vec<Participant> = participants
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();
        let start = order.iter().position(|p| p == start)?;
        let end = order.iter().position(|p| p == end)?;
        Some(Self { order, start, end })
    }

    /// Walk parent links back from `node` to the start.
    fn path_to(&self, parent: &[Option<usize>], node: usize) -> Vec<Participant> {
        let mut path = vec![self.order[node].clone()];
        let mut current = node;
        while let Some(prev) = parent[current] {
            path.push(self.order[prev].clone());
            current = prev;
        }
        path.reverse();
        path
    }
}

/// Find the shortest chain of positive debts leading from `start` to `end`.
///
/// Breadth-first: a participant is marked visited when it is enqueued, so each
/// participant is expanded at most once and the first path that reaches `end`
/// has the fewest edges. Neighbours are tried in `participants()` order, which
/// breaks ties between equally short paths. The step `u -> v` is taken when
/// `lookup(u, v) > 0`; `u -> u` is never looked up.
///
/// Returns the path `[start, .., end]`, or `None` when `end` is unreachable or
/// either endpoint is missing from the graph. When `start == end` the trivial
/// path `[start]` is returned without any lookups.
///
/// Lookup failures abort the search and are returned unchanged.
pub fn find_path<G: DebtGraph>(
    graph: &G,
    start: &Participant,
    end: &Participant,
) -> Result<Option<Vec<Participant>>, G::Error> {
    let Some(space) = SearchSpace::new(graph.participants()?, start, end) else {
        debug!("path search {} -> {}: endpoint not in graph", start, end);
        return Ok(None);
    };
    if space.start == space.end {
        return Ok(Some(vec![start.clone()]));
    }

    let n = space.order.len();
    let mut visited = vec![false; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut frontier = VecDeque::new();

    visited[space.start] = true;
    frontier.push_back(space.start);

    while let Some(u) = frontier.pop_front() {
        for v in 0..n {
            if v == u || visited[v] {
                continue;
            }
            if graph.lookup(&space.order[u], &space.order[v])? == 0 {
                continue;
            }
            visited[v] = true;
            parent[v] = Some(u);
            trace!("enqueue {} via {}", space.order[v], space.order[u]);
            if v == space.end {
                let path = space.path_to(&parent, v);
                debug!("path search {} -> {}: found {} edge(s)", start, end, path.len() - 1);
                return Ok(Some(path));
            }
            frontier.push_back(v);
        }
    }

    debug!("path search {} -> {}: no path", start, end);
    Ok(None)
}

/// Asynchronous [`find_path`].
///
/// The search advances one frontier level at a time. All lookups a level
/// needs are issued concurrently, then their results are consumed in the same
/// order the sequential search would use, so both functions return the same
/// path for the same snapshot. The first lookup error cancels the level and
/// is returned.
pub async fn find_path_async<G: AsyncDebtGraph>(
    graph: &G,
    start: &Participant,
    end: &Participant,
) -> Result<Option<Vec<Participant>>, G::Error> {
    let Some(space) = SearchSpace::new(graph.participants().await?, start, end) else {
        debug!("async path search {} -> {}: endpoint not in graph", start, end);
        return Ok(None);
    };
    if space.start == space.end {
        return Ok(Some(vec![start.clone()]));
    }

    let n = space.order.len();
    let mut visited = vec![false; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut level = vec![space.start];
    visited[space.start] = true;

    while !level.is_empty() {
        // Candidates are every unvisited neighbour as of the start of this level.
        let candidates: Vec<(usize, usize)> = level
            .iter()
            .flat_map(|&u| (0..n).map(move |v| (u, v)))
            .filter(|&(u, v)| u != v && !visited[v])
            .collect();

        let amounts = try_join_all(
            candidates
                .iter()
                .map(|&(u, v)| graph.lookup(&space.order[u], &space.order[v])),
        )
        .await?;

        let mut next = Vec::new();
        for (&(u, v), amount) in candidates.iter().zip(amounts) {
            if amount == 0 || visited[v] {
                continue;
            }
            visited[v] = true;
            parent[v] = Some(u);
            if v == space.end {
                let path = space.path_to(&parent, v);
                debug!(
                    "async path search {} -> {}: found {} edge(s)",
                    start,
                    end,
                    path.len() - 1
                );
                return Ok(Some(path));
            }
            next.push(v);
        }
        level = next;
    }

    debug!("async path search {} -> {}: no path", start, end);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ledger::DebtLedger;
    use std::cell::RefCell;
    use std::convert::Infallible;

    fn p(id: &str) -> Participant {
        Participant::new(id)
    }

    fn ledger(participants: &[&str], debts: &[(&str, &str, u64)]) -> DebtLedger {
        let mut ledger = DebtLedger::new();
        for id in participants {
            ledger.register(p(id));
        }
        for (d, c, a) in debts {
            ledger.set_debt(p(d), p(c), *a).unwrap();
        }
        ledger
    }

    /// Records every lookup so tests can assert on what was consulted.
    struct Recording<'a> {
        inner: &'a DebtLedger,
        calls: RefCell<Vec<(Participant, Participant)>>,
    }

    impl DebtGraph for Recording<'_> {
        type Error = Infallible;

        fn participants(&self) -> Result<Vec<Participant>, Infallible> {
            Ok(self.inner.participant_list().to_vec())
        }

        fn lookup(&self, d: &Participant, c: &Participant) -> Result<u64, Infallible> {
            self.calls.borrow_mut().push((d.clone(), c.clone()));
            Ok(self.inner.debt(d, c))
        }
    }

    #[test]
    fn test_direct_edge() {
        let g = ledger(&["A", "B"], &[("A", "B", 5)]);
        assert_eq!(find_path(&g, &p("A"), &p("B")).unwrap(), Some(vec![p("A"), p("B")]));
    }

    #[test]
    fn test_follows_debt_direction() {
        // B owes A: a path exists from B to A, not from A to B.
        let g = ledger(&["A", "B"], &[("B", "A", 3)]);
        assert_eq!(find_path(&g, &p("B"), &p("A")).unwrap(), Some(vec![p("B"), p("A")]));
        assert_eq!(find_path(&g, &p("A"), &p("B")).unwrap(), None);
    }

    #[test]
    fn test_shortest_path_wins() {
        // Long route A -> B -> C -> D and a shortcut A -> E -> D.
        let g = ledger(
            &["A", "B", "C", "D", "E"],
            &[("A", "B", 1), ("B", "C", 1), ("C", "D", 1), ("A", "E", 1), ("E", "D", 1)],
        );
        assert_eq!(
            find_path(&g, &p("A"), &p("D")).unwrap(),
            Some(vec![p("A"), p("E"), p("D")])
        );
    }

    #[test]
    fn test_tie_broken_by_participant_order() {
        let debts = [("S", "X", 1), ("S", "Y", 1), ("X", "T", 1), ("Y", "T", 1)];
        let g = ledger(&["S", "Y", "X", "T"], &debts);
        assert_eq!(
            find_path(&g, &p("S"), &p("T")).unwrap(),
            Some(vec![p("S"), p("Y"), p("T")])
        );
        let g = ledger(&["S", "X", "Y", "T"], &debts);
        assert_eq!(
            find_path(&g, &p("S"), &p("T")).unwrap(),
            Some(vec![p("S"), p("X"), p("T")])
        );
    }

    #[test]
    fn test_zero_edges_are_absent() {
        let mut g = ledger(&["A", "B"], &[("A", "B", 4)]);
        g.set_debt(p("A"), p("B"), 0).unwrap();
        assert_eq!(find_path(&g, &p("A"), &p("B")).unwrap(), None);
    }

    #[test]
    fn test_missing_endpoint_short_circuits() {
        let g = ledger(&["A", "B"], &[("A", "B", 4)]);
        let recording = Recording {
            inner: &g,
            calls: RefCell::new(Vec::new()),
        };
        assert_eq!(find_path(&recording, &p("A"), &p("Z")).unwrap(), None);
        assert!(recording.calls.borrow().is_empty());

        let empty = DebtLedger::new();
        assert_eq!(find_path(&empty, &p("A"), &p("B")).unwrap(), None);
    }

    #[test]
    fn test_never_looks_up_self_or_revisits() {
        // Dense graph: everyone owes everyone.
        let ids = ["A", "B", "C", "D"];
        let mut debts = Vec::new();
        for d in ids {
            for c in ids {
                if d != c {
                    debts.push((d, c, 1));
                }
            }
        }
        let g = ledger(&ids, &debts);
        let recording = Recording {
            inner: &g,
            calls: RefCell::new(Vec::new()),
        };
        find_path(&recording, &p("A"), &p("Z")).unwrap();
        assert!(recording.calls.borrow().is_empty());

        let mut ledger_without_target = g.clone();
        ledger_without_target.register(p("Z"));
        let recording = Recording {
            inner: &ledger_without_target,
            calls: RefCell::new(Vec::new()),
        };
        assert_eq!(find_path(&recording, &p("A"), &p("Z")).unwrap(), None);
        let calls = recording.calls.borrow();
        assert!(calls.iter().all(|(d, c)| d != c));
        // A checks B, C, D, Z; B, C and D each only check the unvisited Z.
        assert_eq!(calls.len(), 7);
        let expanded: HashSet<&Participant> = calls.iter().map(|(d, _)| d).collect();
        assert_eq!(expanded.len(), 4);
    }

    #[test]
    fn test_trivial_path() {
        let g = ledger(&["A"], &[]);
        assert_eq!(find_path(&g, &p("A"), &p("A")).unwrap(), Some(vec![p("A")]));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let g = ledger(
            &["A", "B", "C", "D", "E", "F"],
            &[
                ("A", "C", 2),
                ("A", "B", 2),
                ("B", "D", 1),
                ("C", "D", 1),
                ("D", "F", 9),
                ("C", "E", 4),
                ("E", "F", 1),
            ],
        );
        for (s, e) in [("A", "F"), ("F", "A"), ("B", "F"), ("A", "E"), ("C", "B")] {
            let sync = find_path(&g, &p(s), &p(e)).unwrap();
            let asynchronous = find_path_async(&g, &p(s), &p(e)).await.unwrap();
            assert_eq!(sync, asynchronous, "{} -> {}", s, e);
        }
    }
}
