use iou_netting::core::error::{InvalidIou, ResolveError};
use iou_netting::core::iou::{Amount, ProposedIou};
use iou_netting::core::participant::Participant;
use iou_netting::graph::debt_graph::AsyncDebtGraph;
use iou_netting::graph::ledger::DebtLedger;
use iou_netting::resolution::resolver::{resolve, resolve_async, CycleResolver, Resolution};
use iou_netting::resolution::verify::verify_cycle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn p(id: &str) -> Participant {
    Participant::new(id)
}

/// A remote ledger stand-in: every lookup sleeps, and one edge can be made
/// to fail.
struct RemoteLedger {
    participants: Vec<Participant>,
    debts: HashMap<(Participant, Participant), Amount>,
    broken_edge: Option<(Participant, Participant)>,
    lookups: AtomicUsize,
}

#[derive(Debug, PartialEq)]
struct RpcError(String);

impl RemoteLedger {
    fn new(participants: &[&str], debts: &[(&str, &str, Amount)]) -> Self {
        Self {
            participants: participants.iter().map(|id| p(id)).collect(),
            debts: debts
                .iter()
                .map(|(d, c, a)| ((p(d), p(c)), *a))
                .collect(),
            broken_edge: None,
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl AsyncDebtGraph for RemoteLedger {
    type Error = RpcError;

    async fn participants(&self) -> Result<Vec<Participant>, RpcError> {
        Ok(self.participants.clone())
    }

    async fn lookup(&self, debtor: &Participant, creditor: &Participant) -> Result<Amount, RpcError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        let key = (debtor.clone(), creditor.clone());
        if self.broken_edge.as_ref() == Some(&key) {
            return Err(RpcError(format!("timeout reading {} -> {}", debtor, creditor)));
        }
        Ok(self.debts.get(&key).copied().unwrap_or(0))
    }
}

/// Walks the three documented scenarios end to end through a ledger.
#[test]
fn documented_scenarios() {
    // Three-party cycle.
    let mut ledger = DebtLedger::new();
    for id in ["A", "B", "C"] {
        ledger.register(p(id));
    }
    ledger.set_debt(p("B"), p("C"), 5).unwrap();
    ledger.set_debt(p("C"), p("A"), 5).unwrap();
    let resolution = resolve(p("A"), p("B"), 10, &ledger).unwrap();
    assert_eq!(resolution.cycle().unwrap(), &[p("A"), p("B"), p("C"), p("A")]);
    assert_eq!(resolution.min_amount(), Some(5));
    let updates: Vec<(String, String, Amount)> = resolution
        .deltas()
        .iter()
        .map(|d| (d.debtor.to_string(), d.creditor.to_string(), d.new_amount))
        .collect();
    assert_eq!(
        updates,
        vec![
            ("a".to_string(), "b".to_string(), 5),
            ("b".to_string(), "c".to_string(), 0),
            ("c".to_string(), "a".to_string(), 0),
        ]
    );

    // Empty ledger.
    let empty = DebtLedger::new();
    assert_eq!(resolve(p("A"), p("B"), 7, &empty).unwrap(), Resolution::Direct(7));

    // Two-party cycle.
    let mut ledger = DebtLedger::new();
    ledger.set_debt(p("B"), p("A"), 3).unwrap();
    let resolution = resolve(p("A"), p("B"), 5, &ledger).unwrap();
    assert_eq!(resolution.cycle().unwrap(), &[p("A"), p("B"), p("A")]);
    assert_eq!(resolution.min_amount(), Some(3));
    assert_eq!(resolution.deltas()[0].new_amount, 2);
    assert_eq!(resolution.deltas()[1].new_amount, 0);
}

/// A shared-expenses group recording IOUs one after another.
#[test]
fn group_ledger_nets_as_it_goes() {
    let mut ledger = DebtLedger::new();
    let record = |ledger: &mut DebtLedger, d: &str, c: &str, a: Amount| {
        let iou = ProposedIou::new(p(d), p(c), a).unwrap();
        ledger.record_iou(iou, None).resolution().clone()
    };

    assert!(!record(&mut ledger, "alice", "bob", 30).is_netted());
    assert!(!record(&mut ledger, "bob", "carol", 20).is_netted());
    // carol -> alice closes alice -> bob -> carol -> alice, bottleneck 20.
    let resolution = record(&mut ledger, "carol", "alice", 25);
    assert_eq!(resolution.min_amount(), Some(20));

    assert_eq!(ledger.debt(&p("alice"), &p("bob")), 10);
    assert_eq!(ledger.debt(&p("bob"), &p("carol")), 0);
    assert_eq!(ledger.debt(&p("carol"), &p("alice")), 5);
    assert_eq!(ledger.edge_count(), 2);

    assert_eq!(ledger.total_owed(&p("alice")), 10);
    assert_eq!(ledger.total_owed_to(&p("alice")), 5);
    assert_eq!(ledger.journal().len(), 3);
    assert!(ledger.journal()[2].resolution().is_netted());
}

/// Identifiers that differ only in case are one participant.
#[test]
fn mixed_case_addresses_form_a_cycle() {
    let mut ledger = DebtLedger::new();
    ledger
        .set_debt(p("0xB0B0000000000000000000000000000000000001"), p("0xa11ce00000000000000000000000000000000001"), 12)
        .unwrap();
    let resolution = resolve(
        p("0xA11CE00000000000000000000000000000000001"),
        p("0xb0b0000000000000000000000000000000000001"),
        12,
        &ledger,
    )
    .unwrap();
    assert_eq!(resolution.min_amount(), Some(12));
    assert!(resolution.deltas().iter().all(|d| d.clears_edge()));
}

#[test]
fn invalid_proposals_rejected() {
    let ledger = DebtLedger::new();
    assert!(matches!(
        resolve(p("A"), p("B"), 0, &ledger),
        Err(ResolveError::InvalidInput(InvalidIou::NonPositiveAmount))
    ));
    assert!(matches!(
        resolve(p("Ann"), p("ANN"), 3, &ledger),
        Err(ResolveError::InvalidInput(InvalidIou::SelfDebt { .. }))
    ));
    assert!(matches!(
        resolve(p(" "), p("B"), 3, &ledger),
        Err(ResolveError::InvalidInput(InvalidIou::BlankParticipant))
    ));
}

/// Resolution computed on one snapshot, verified against a later one.
#[test]
fn submitted_cycle_checked_against_current_state() {
    let mut ledger = DebtLedger::new();
    ledger.set_debt(p("B"), p("C"), 4).unwrap();
    ledger.set_debt(p("C"), p("A"), 6).unwrap();
    let iou = ProposedIou::new(p("A"), p("B"), 9).unwrap();

    let resolution = CycleResolver::resolve(&ledger, &iou).unwrap();
    let cycle = resolution.cycle().unwrap().to_vec();
    assert_eq!(verify_cycle(&ledger, &iou, &cycle).unwrap(), 4);

    // Another writer settles B -> C in the meantime.
    ledger.set_debt(p("B"), p("C"), 0).unwrap();
    assert!(verify_cycle(&ledger, &iou, &cycle).is_err());
    assert!(ledger.apply(&iou, &resolution).is_err());
    assert_eq!(ledger.debt(&p("C"), &p("A")), 6);
    assert_eq!(CycleResolver::resolve(&ledger, &iou).unwrap(), Resolution::Direct(9));
}

/// A resolution shipped as JSON is only committed if it still fits the ledger.
#[test]
fn resolution_from_json_applied_to_ledger() {
    let mut ledger = DebtLedger::new();
    ledger.set_debt(p("B"), p("A"), 3).unwrap();
    let iou = ProposedIou::new(p("A"), p("B"), 5).unwrap();
    let json = serde_json::to_string(&CycleResolver::resolve(&ledger, &iou).unwrap()).unwrap();
    let shipped: Resolution = serde_json::from_str(&json).unwrap();

    let mut moved_on = ledger.clone();
    moved_on.set_debt(p("B"), p("A"), 100).unwrap();
    assert!(moved_on.apply(&iou, &shipped).is_err());
    assert_eq!(moved_on.debt(&p("B"), &p("A")), 100);

    ledger.apply(&iou, &shipped).unwrap();
    assert_eq!(ledger.debt(&p("B"), &p("A")), 0);
    assert_eq!(ledger.debt(&p("A"), &p("B")), 2);
    assert_eq!(serde_json::to_value(&ledger).unwrap()["debts"][0]["amount"], 2);
}

#[test]
fn resolution_round_trips_through_json() {
    let mut ledger = DebtLedger::new();
    ledger.set_debt(p("B"), p("A"), 3).unwrap();
    let resolution = resolve(p("A"), p("B"), 5, &ledger).unwrap();

    let json = serde_json::to_string(&resolution).unwrap();
    let back: Resolution = serde_json::from_str(&json).unwrap();
    assert_eq!(back, resolution);
}

#[test]
fn ledger_file_survives_recording() {
    let json = r#"{
        "participants": ["alice", "bob", "carol"],
        "debts": [
            { "debtor": "bob", "creditor": "carol", "amount": 5 },
            { "debtor": "carol", "creditor": "alice", "amount": 5 }
        ]
    }"#;
    let mut ledger: DebtLedger = serde_json::from_str(json).unwrap();
    let iou = ProposedIou::new(p("Alice"), p("Bob"), 10).unwrap();
    ledger.record_iou(iou, Some("concert tickets".to_string()));

    let saved = serde_json::to_value(&ledger).unwrap();
    assert_eq!(saved["debts"].as_array().unwrap().len(), 1);
    assert_eq!(saved["journal"][0]["memo"], "concert tickets");

    let reloaded: DebtLedger = serde_json::from_value(saved).unwrap();
    assert_eq!(reloaded.edges(), ledger.edges());
    assert_eq!(reloaded.participant_list(), ledger.participant_list());
}

#[tokio::test]
async fn async_resolution_over_remote_lookups() {
    let remote = RemoteLedger::new(
        &["A", "B", "C", "D", "E"],
        &[("B", "D", 4), ("D", "A", 6), ("B", "C", 9), ("C", "E", 9), ("E", "A", 9)],
    );
    let resolution = resolve_async(p("A"), p("B"), 10, &remote).await.unwrap();
    assert_eq!(resolution.cycle().unwrap(), &[p("A"), p("B"), p("D"), p("A")]);
    assert_eq!(resolution.min_amount(), Some(4));
    assert!(remote.lookups.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn async_lookup_failure_is_not_treated_as_zero() {
    let mut remote = RemoteLedger::new(&["A", "B"], &[("B", "A", 3)]);
    remote.broken_edge = Some((p("B"), p("A")));
    match resolve_async(p("A"), p("B"), 5, &remote).await {
        Err(ResolveError::Lookup(RpcError(message))) => assert!(message.contains("timeout")),
        other => panic!("expected lookup failure, got {:?}", other.map(|r| r.is_netted())),
    }
}

#[tokio::test]
async fn abandoned_resolution_leaves_nothing_behind() {
    let remote = RemoteLedger::new(&["A", "B", "C"], &[("B", "C", 1), ("C", "A", 1)]);
    let iou = ProposedIou::new(p("A"), p("B"), 1).unwrap();

    let timed_out = tokio::time::timeout(
        Duration::from_micros(1),
        CycleResolver::resolve_async(&remote, &iou),
    )
    .await;
    assert!(timed_out.is_err());

    // A fresh attempt on the same snapshot is unaffected.
    let resolution = CycleResolver::resolve_async(&remote, &iou).await.unwrap();
    assert!(resolution.is_netted());
}
