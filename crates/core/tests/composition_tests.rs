//! Properties of override-aware composition that hold for any registration order.

use strata_core::composition::{CompositionEngine, SkipReason};
use strata_core::{
    Binder, BootError, ConfigUnit, ConfigUnitProvider, ConstructionError, UnitTypeId,
};

macro_rules! unit_types {
    ($($name:ident),*) => {
        $(
            #[derive(Default)]
            struct $name;

            impl ConfigUnit for $name {
                fn configure(&self, _binder: &mut Binder) -> Result<(), ConstructionError> {
                    Ok(())
                }
            }
        )*
    };
}

unit_types!(Jdbc, JdbcTest, Jetty, JettyTest, Logback, Metrics);

fn provider<M: ConfigUnit + Default>() -> ConfigUnitProvider {
    ConfigUnitProvider::of::<M>()
}

fn id<M: 'static>() -> UnitTypeId {
    UnitTypeId::of::<M>()
}

#[test]
fn test_layers_follow_base_registration_order() {
    let resolution = CompositionEngine::new(vec![
        provider::<Logback>(),
        provider::<JdbcTest>().overriding([id::<Jdbc>()]),
        provider::<Jetty>(),
        provider::<Jdbc>(),
    ])
    .resolve()
    .unwrap();

    assert_eq!(
        resolution.composition().structure(),
        vec![
            vec![id::<Logback>()],
            vec![id::<Jetty>()],
            vec![id::<Jdbc>(), id::<JdbcTest>()],
        ]
    );
}

#[test]
fn test_chained_overrides_join_the_base_layer() {
    let providers = vec![
        provider::<Jdbc>(),
        provider::<Jetty>(),
        provider::<JdbcTest>().overriding([id::<Jdbc>()]),
        provider::<JettyTest>().overriding([id::<Jetty>()]),
        provider::<Metrics>().overriding([id::<JdbcTest>()]),
    ];
    let count = providers.len();

    let resolution = CompositionEngine::new(providers).resolve().unwrap();
    let placed: usize = resolution
        .composition()
        .structure()
        .iter()
        .map(Vec::len)
        .sum();

    assert_eq!(placed, count);
    assert_eq!(resolution.applied().len(), 3);
    let jdbc_chain: Vec<UnitTypeId> = resolution
        .composition()
        .layer_for(id::<Jdbc>())
        .map(|layer| layer.override_chain().iter().map(|e| e.unit_type()).collect())
        .unwrap_or_default();
    assert_eq!(jdbc_chain, vec![id::<JdbcTest>(), id::<Metrics>()]);
}

#[test]
fn test_resolution_is_idempotent() {
    let providers = vec![
        provider::<Jdbc>(),
        provider::<JdbcTest>().overriding([id::<Jdbc>()]),
        provider::<Jetty>(),
    ];

    let first = CompositionEngine::new(providers.clone()).resolve().unwrap();
    let second = CompositionEngine::new(providers).resolve().unwrap();

    assert_eq!(first.composition().structure(), second.composition().structure());
    assert_eq!(first.diagnostics(), second.diagnostics());
    assert_eq!(first.report(), second.report());
}

#[test]
fn test_conflict_is_reported_in_either_order() {
    for providers in [
        vec![provider::<Jdbc>().named("first"), provider::<Jdbc>().named("second")],
        vec![provider::<Jdbc>().named("second"), provider::<Jdbc>().named("first")],
    ] {
        let registered: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();
        let error = CompositionEngine::new(providers).resolve().unwrap_err();
        match error {
            BootError::CompositionConflict {
                unit_type,
                providers,
            } => {
                assert_eq!(unit_type, "Jdbc");
                assert_eq!(providers, registered);
            }
            other => panic!("expected conflict, got {}", other),
        }
    }
}

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut all = Vec::new();
    for (i, &first) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, first);
            all.push(tail);
        }
    }
    all
}

#[test]
fn test_layer_order_follows_bases_in_every_registration_order() {
    let providers = vec![
        provider::<Logback>(),
        provider::<Jetty>(),
        provider::<Jdbc>(),
        provider::<JdbcTest>().overriding([id::<Jdbc>()]),
    ];
    let layer_of = |i: usize| match i {
        0 => Some(vec![id::<Logback>()]),
        1 => Some(vec![id::<Jetty>()]),
        2 => Some(vec![id::<Jdbc>(), id::<JdbcTest>()]),
        _ => None,
    };

    let orders = permutations(&[0, 1, 2, 3]);
    assert_eq!(orders.len(), 24);

    for order in orders {
        let registered: Vec<ConfigUnitProvider> =
            order.iter().map(|&i| providers[i].clone()).collect();
        let expected: Vec<Vec<UnitTypeId>> = order.iter().filter_map(|&i| layer_of(i)).collect();

        let resolution = CompositionEngine::new(registered).resolve().unwrap();

        assert_eq!(resolution.composition().structure(), expected, "order {:?}", order);
        assert_eq!(resolution.applied().len(), 1);
    }
}

#[test]
fn test_cycle_is_reported_identically_in_either_order() {
    let forward = vec![
        provider::<Jetty>().overriding([id::<Logback>()]),
        provider::<Logback>().overriding([id::<Jetty>()]),
    ];
    let backward = vec![
        provider::<Logback>().overriding([id::<Jetty>()]),
        provider::<Jetty>().overriding([id::<Logback>()]),
    ];

    let forward = CompositionEngine::new(forward).resolve().unwrap_err();
    let backward = CompositionEngine::new(backward).resolve().unwrap_err();

    assert!(forward.is_cycle());
    assert_eq!(forward.to_string(), backward.to_string());
    assert_eq!(
        forward.to_string(),
        "Override cycle detected: Jetty -> Logback -> Jetty"
    );
}

#[test]
fn test_conflict_wins_over_cycle() {
    let error = CompositionEngine::new(vec![
        provider::<Jetty>().overriding([id::<Logback>()]),
        provider::<Logback>().overriding([id::<Jetty>()]),
        provider::<Metrics>().named("m1"),
        provider::<Metrics>().named("m2"),
    ])
    .resolve()
    .unwrap_err();

    assert!(matches!(error, BootError::CompositionConflict { .. }));
}

#[test]
fn test_one_diagnostic_per_applied_edge() {
    let resolution = CompositionEngine::new(vec![
        provider::<Jdbc>(),
        provider::<Jetty>(),
        provider::<Metrics>().overriding([id::<Jdbc>(), id::<Jetty>(), id::<Logback>()]),
    ])
    .resolve()
    .unwrap();

    assert_eq!(
        resolution.diagnostics(),
        vec![
            "Metrics overrides Jdbc's Jdbc".to_string(),
            "Metrics overrides Jetty's Jetty".to_string(),
        ]
    );
    assert_eq!(resolution.skipped().len(), 1);
    assert_eq!(resolution.skipped()[0].reason, SkipReason::NotRegistered);
    assert_eq!(
        resolution.skipped()[0].to_string(),
        "Metrics declares override of Logback, which is not registered; ignoring"
    );

    let report = resolution.report();
    assert_eq!(report.layers.len(), 2);
    assert_eq!(report.layers[0].overrides[0].provider, "Metrics");
    assert_eq!(report.layers[1].overrides[0].provider, "Metrics");
}

#[test]
fn test_report_serializes_to_json() {
    let resolution = CompositionEngine::new(vec![
        provider::<Jdbc>(),
        provider::<JdbcTest>().overriding([id::<Jdbc>()]),
    ])
    .resolve()
    .unwrap();

    let json = serde_json::to_value(resolution.report()).unwrap();

    assert_eq!(json["layers"][0]["base"]["provider"], "Jdbc");
    assert_eq!(json["layers"][0]["overrides"][0]["unit_type"], "JdbcTest");
    assert_eq!(json["applied"][0], "JdbcTest overrides Jdbc's Jdbc");
}
