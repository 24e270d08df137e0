//! Property-based invariant tests for language switching.
//!
//! Runs random interleavings of switch requests and loader resolutions
//! against loaders that only resolve when the test says so:
//!
//! 1. `current_lang`, when set, always has a dictionary in the store
//! 2. `loading_lang`, when set, is the most recently accepted request
//! 3. `current_lang` only ever changes to the most recently accepted request
//! 4. Once every load has resolved, nothing is loading and the last accepted
//!    request is current
//! 5. End callbacks fire at most once per accepted request, never for stale loads

use lang_switch::{Action, StoreState, SwitchCoordinator, SwitchOptions};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

// ── Helpers ──────────────────────────────────────────────────────────

const LANGS: [&str; 3] = ["en", "ru", "es"];

#[derive(Debug, Clone)]
enum Op {
    Switch(usize),
    Resolve(usize),
    Yield,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..LANGS.len()).prop_map(Op::Switch),
        (0..LANGS.len()).prop_map(Op::Resolve),
        Just(Op::Yield),
    ]
}

type Waiting = Arc<Mutex<Vec<(String, oneshot::Sender<Value>)>>>;

fn gated_loader(
    waiting: Waiting,
) -> impl Fn(String) -> futures::future::BoxFuture<'static, anyhow::Result<Value>> + Send + Sync + 'static
{
    use futures::FutureExt;
    move |lang: String| {
        let (tx, rx) = oneshot::channel();
        waiting.lock().unwrap().push((lang, tx));
        async move { Ok::<_, anyhow::Error>(rx.await?) }.boxed()
    }
}

fn resolve_first(waiting: &Waiting, lang: &str) {
    let mut waiting = waiting.lock().unwrap();
    if let Some(index) = waiting.iter().position(|(pending, _)| pending == lang) {
        let (lang, tx) = waiting.remove(index);
        let _ = tx.send(json!({ "lang": lang }));
    }
}

fn check_state(
    state: &StoreState<Value>,
    previous_current: Option<&str>,
    last_accepted: Option<&str>,
) -> Result<(), TestCaseError> {
    if let Some(current) = &state.current_lang {
        prop_assert!(
            state.dictionaries.contains_key(current),
            "current language {} has no dictionary",
            current
        );
    }
    if state.current_lang.as_deref() != previous_current {
        prop_assert_eq!(state.current_lang.as_deref(), last_accepted);
    }
    if let Some(loading) = &state.loading_lang {
        prop_assert_eq!(Some(loading.as_str()), last_accepted);
    }
    Ok(())
}

fn run(ops: Vec<Op>, cache: bool) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    runtime.block_on(async move {
        let waiting: Waiting = Arc::default();
        let ends = Arc::new(AtomicUsize::new(0));
        let ends_clone = ends.clone();
        let coordinator = SwitchCoordinator::new(
            gated_loader(waiting.clone()),
            SwitchOptions::<Value>::new()
                .with_cache(cache)
                .on_end_switch(move |_, _, _| {
                    ends_clone.fetch_add(1, Ordering::SeqCst);
                }),
        )
        .expect("Runtime is available");

        let mut last_accepted: Option<String> = None;
        let mut accepted = 0usize;
        let mut previous_current: Option<String> = None;

        for op in ops {
            match op {
                Op::Switch(i) => {
                    let lang = LANGS[i];
                    let was_current = coordinator.current_lang().as_deref() == Some(lang);
                    coordinator
                        .handle(Action::<()>::switch_lang(lang), &(), |_| ())
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                    if !was_current {
                        accepted += 1;
                        last_accepted = Some(lang.to_string());
                    }
                }
                Op::Resolve(i) => resolve_first(&waiting, LANGS[i]),
                Op::Yield => tokio::task::yield_now().await,
            }
            let state = coordinator.state();
            check_state(&state, previous_current.as_deref(), last_accepted.as_deref())?;
            previous_current = state.current_lang;
        }

        // Drain every pending load
        loop {
            let next = waiting.lock().unwrap().first().map(|(lang, _)| lang.clone());
            match next {
                Some(lang) => resolve_first(&waiting, &lang),
                None => break,
            }
        }
        coordinator.settle().await;

        let state = coordinator.state();
        check_state(&state, previous_current.as_deref(), last_accepted.as_deref())?;
        prop_assert_eq!(state.loading_lang, None);
        prop_assert_eq!(state.current_lang, last_accepted);
        prop_assert!(ends.load(Ordering::SeqCst) <= accepted);
        Ok(())
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1-5. Invariants over random interleavings, cache on
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn switch_invariants_with_cache(ops in prop::collection::vec(op_strategy(), 0..40)) {
        run(ops, true)?;
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1-5. Same invariants with caching disabled
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn switch_invariants_without_cache(ops in prop::collection::vec(op_strategy(), 0..40)) {
        run(ops, false)?;
    }
}
