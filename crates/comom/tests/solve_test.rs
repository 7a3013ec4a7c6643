//! End-to-end solves through the configuration layer.

use comom::{solve, solve_and_store, Backend, SolverConfig};
use comom_core::{ConvolutionOracle, QnModel, VectorOrdering};
use num_rational::BigRational;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn two_class_model() -> QnModel {
    QnModel::from_integers(vec![3, 2], vec![1, 2], vec![vec![1, 2], vec![2, 1]])
        .unwrap()
        .with_multiplicities(vec![1, 2])
        .unwrap()
}

#[test]
fn test_backends_give_identical_solutions() {
    init_tracing();
    let model = two_class_model();
    let btf = solve(&model, &SolverConfig::default()).unwrap();
    let modular = solve(
        &model,
        &SolverConfig::from_toml_str(
            r#"
backend = "modular"
ordering = "leftmost_nonzero"
"#,
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(btf, modular);

    let mut oracle = ConvolutionOracle::new(&model);
    assert_eq!(btf.normalising_constant, oracle.normalising_constant());
    assert_eq!(btf.measures, oracle.performance_measures().unwrap());
}

#[test]
fn test_btf_rejects_other_orderings() {
    let config = SolverConfig {
        backend: Backend::Btf,
        ordering: VectorOrdering::BinarySupport,
        ..Default::default()
    };
    let err = solve(&two_class_model(), &config).unwrap_err();
    assert!(err.to_string().contains("support_colex"));
}

#[test]
fn test_modular_option_errors_carry_context() {
    let config = SolverConfig::from_toml_str(
        r#"
backend = "modular"

[modular]
prime_bits = 4
"#,
    )
    .unwrap();
    let err = solve(&two_class_model(), &config).unwrap_err();
    assert!(err.to_string().contains("modular solver"));
}

#[test]
fn test_solve_and_store_sets_constant_once() {
    let mut model = QnModel::from_integers(vec![4], vec![3], vec![vec![2]]).unwrap();
    let config = SolverConfig::default();
    let solution = solve_and_store(&mut model, &config).unwrap();
    assert_eq!(
        model.normalising_constant(),
        Some(&BigRational::new(563.into(), 8.into()))
    );
    assert_eq!(solution.normalising_constant, BigRational::new(563.into(), 8.into()));
    assert!(solve_and_store(&mut model, &config).is_err());
}
