use proptest::prelude::*;
use stratforge::catalog::{BlockCatalog, KindId, ParamValue};
use stratforge::codegen::{emit, EmitTarget};
use stratforge::composer::StrategyComposer;
use stratforge::models::{InstanceId, StrategyDraft};
use stratforge::persistence::{MemoryTemplateStore, TemplateStore};
use stratforge::session::EditingSession;
use stratforge::validation::validate;

#[derive(Debug, Clone)]
enum Op {
    Insert { kind: usize, at: Option<usize> },
    Move { pick: usize, to: usize },
    Remove { pick: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), proptest::option::of(0usize..12))
            .prop_map(|(kind, at)| Op::Insert { kind, at }),
        (any::<usize>(), 0usize..12).prop_map(|(pick, to)| Op::Move { pick, to }),
        any::<usize>().prop_map(|pick| Op::Remove { pick }),
    ]
}

fn all_kinds() -> Vec<KindId> {
    KindId::all()
}

fn draft_of(name: &str, kinds: &[KindId]) -> StrategyDraft {
    let mut composer = StrategyComposer::new(BlockCatalog::builtin());
    for kind in kinds {
        composer.insert_kind(*kind, None).unwrap();
    }
    StrategyDraft {
        name: name.to_string(),
        blocks: composer.snapshot(),
        ..StrategyDraft::default()
    }
}

/// Same content as `draft_of`, reached another way: blocks are inserted
/// back to front and every parameter is written again in reverse key order.
fn rebuilt_draft_of(name: &str, kinds: &[KindId]) -> StrategyDraft {
    let mut composer = StrategyComposer::new(BlockCatalog::builtin());
    for kind in kinds.iter().rev() {
        composer.insert_kind(*kind, Some(0)).unwrap();
    }
    for block in composer.snapshot() {
        for (param, value) in block.values.iter().rev() {
            composer
                .set_parameter(block.instance_id, param, value.clone())
                .unwrap();
        }
    }
    StrategyDraft {
        name: name.to_string(),
        blocks: composer.snapshot(),
        ..StrategyDraft::default()
    }
}

/// Breaks exactly one rule of an RSI (#1) + Buy (#2) draft
fn inject(draft: &mut StrategyDraft, which: usize) {
    match which {
        0 => draft.name = "   ".to_string(),
        1 => draft.risk.stop_loss_pct = 25.0,
        2 => draft.risk.take_profit_pct = 60.0,
        3 => draft.risk.max_position_pct = 1.0,
        4 => draft.trading_hours.start = 30,
        5 => draft.initial_balance = -5.0,
        6 => {
            draft.blocks[0]
                .values
                .insert("period".to_string(), ParamValue::Number(200.0));
        }
        7 => {
            draft.blocks[1]
                .values
                .insert("leverage".to_string(), ParamValue::Number(2.0));
        }
        8 => {
            draft.blocks[1]
                .values
                .insert("order_type".to_string(), ParamValue::from("stop"));
        }
        _ => unreachable!(),
    }
}

const INJECTIONS: usize = 9;

proptest! {
    #[test]
    fn prop_snapshot_tracks_every_mutation(ops in proptest::collection::vec(op(), 0..40)) {
        let catalog = BlockCatalog::builtin();
        let kinds = all_kinds();
        let mut composer = StrategyComposer::new(catalog);
        let mut model: Vec<InstanceId> = Vec::new();

        for op in ops {
            match op {
                Op::Insert { kind, at } => {
                    let id = composer.insert_kind(kinds[kind % kinds.len()], at).unwrap();
                    let index = at.unwrap_or(model.len()).min(model.len());
                    model.insert(index, id);
                }
                Op::Move { pick, to } => {
                    if model.is_empty() {
                        continue;
                    }
                    let id = model.remove(pick % (model.len()));
                    let index = to.min(model.len());
                    model.insert(index, id);
                    prop_assert_eq!(composer.move_block(id, to).unwrap(), index);
                }
                Op::Remove { pick } => {
                    if model.is_empty() {
                        continue;
                    }
                    let id = model.remove(pick % model.len());
                    prop_assert_eq!(composer.remove(id).unwrap().instance_id, id);
                }
            }

            let snapshot: Vec<InstanceId> = composer.snapshot().iter().map(|b| b.instance_id).collect();
            prop_assert_eq!(&snapshot, &model);
        }
    }

    #[test]
    fn prop_every_injected_violation_is_reported(
        mask in proptest::collection::vec(any::<bool>(), INJECTIONS)
    ) {
        let chosen: Vec<usize> = (0..INJECTIONS).filter(|i| mask[*i]).collect();
        let kinds: Vec<KindId> = ["rsi", "buy"].iter().map(|k| k.parse().unwrap()).collect();
        let mut draft = draft_of("RSI buy", &kinds);
        for which in &chosen {
            inject(&mut draft, *which);
        }

        match validate(BlockCatalog::builtin(), &draft) {
            Ok(_) => prop_assert!(chosen.is_empty()),
            Err(violations) => prop_assert_eq!(violations.len(), chosen.len()),
        }
    }

    #[test]
    fn prop_emission_is_deterministic(
        name in "[A-Za-z][A-Za-z0-9 _-]{0,24}",
        picks in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let kinds = all_kinds();
        let mut chosen: Vec<KindId> = picks.iter().map(|p| kinds[p % kinds.len()]).collect();
        chosen.push("buy".parse().unwrap());

        let first = validate(BlockCatalog::builtin(), &draft_of(&name, &chosen)).unwrap();
        let second = validate(BlockCatalog::builtin(), &rebuilt_draft_of(&name, &chosen)).unwrap();
        prop_assert_eq!(
            emit(&first, EmitTarget::Python),
            emit(&second, EmitTarget::Python)
        );
    }

    #[test]
    fn prop_private_records_stay_with_their_owner(
        saves in proptest::collection::vec((0usize..3, any::<bool>()), 1..12)
    ) {
        const OWNERS: [&str; 3] = ["alice", "bob", "carol"];
        let store = MemoryTemplateStore::new();
        let kinds: Vec<KindId> = ["rsi", "buy"].iter().map(|k| k.parse().unwrap()).collect();

        let saved = tokio_test::block_on(async {
            let mut saved = Vec::new();
            for (owner, is_public) in &saves {
                let mut session = EditingSession::from_draft(
                    BlockCatalog::builtin(),
                    OWNERS[*owner],
                    draft_of("Dip", &kinds),
                );
                session.is_public = *is_public;
                saved.push(session.save(&store).await.unwrap());
            }
            saved
        });

        let public = tokio_test::block_on(store.list_public(usize::MAX)).unwrap();
        prop_assert!(public.iter().all(|r| r.is_public));
        prop_assert_eq!(public.len(), saved.iter().filter(|r| r.is_public).count());

        for owner in OWNERS {
            let owned = tokio_test::block_on(store.list_owned_by(owner)).unwrap();
            prop_assert!(owned.iter().all(|r| r.owner_id == owner));
            prop_assert_eq!(owned.len(), saved.iter().filter(|r| r.owner_id == owner).count());
        }
    }
}
