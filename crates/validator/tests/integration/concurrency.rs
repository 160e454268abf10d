//! Sharing one validator between threads

use std::sync::Arc;
use std::thread;

use nebula_structval::{Validate, Validator};
use pretty_assertions::assert_eq;

use crate::common::{failures, summary};

#[test]
fn concurrent_compiles_share_one_chain() {
    let validator = Validator::new();
    let chains: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| validator.compile_tag("required,btwlen=2~8,alphanum").unwrap()))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let first = &chains[0];
    assert_eq!(first.rule_names().collect::<Vec<_>>(), ["required", "btwlen", "alphanum"]);
    for chain in &chains {
        assert!(Arc::ptr_eq(first, chain));
    }
    assert!(Arc::ptr_eq(
        first,
        &validator.compile_tag("required,btwlen=2~8,alphanum").unwrap()
    ));
}

#[derive(Validate)]
struct Job {
    #[validate("required,alphanum")]
    name: String,
    #[validate("gte=1,lte=64")]
    workers: u16,
    #[validate("dive,oneof=low normal high")]
    priorities: Vec<String>,
}

#[test]
fn concurrent_validation_is_deterministic() {
    let validator = Validator::new();
    let job = Job {
        name: "nightly build".into(),
        workers: 0,
        priorities: vec!["normal".into(), "urgent".into()],
    };

    let batches: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                scope.spawn(|| {
                    let errors = failures(validator.validate_struct(&job));
                    summary(&errors)
                        .into_iter()
                        .map(|(ns, tag)| (ns.to_owned(), tag.to_owned()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let expected = vec![
        ("Job.name".to_owned(), "alphanum".to_owned()),
        ("Job.workers".to_owned(), "gte".to_owned()),
        ("Job.priorities[1]".to_owned(), "oneof".to_owned()),
    ];
    for batch in batches {
        assert_eq!(batch, expected);
    }
}

#[test]
fn validator_behind_arc() {
    let validator = Arc::new(Validator::new());
    let handles: Vec<_> = (0..4_u16)
        .map(|workers| {
            let validator = Arc::clone(&validator);
            thread::spawn(move || {
                let job = Job {
                    name: format!("job{workers}"),
                    workers,
                    priorities: Vec::new(),
                };
                validator.validate_struct(&job).is_ok()
            })
        })
        .collect();

    let outcomes: Vec<bool> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert_eq!(outcomes, vec![false, true, true, true]);
}
