/// **(internal)** Test the concrete end-to-end monitoring scenarios on small
/// line-shaped models, including the boundary cases of trace evaluation.
mod _test_scenarios;

/// **(internal)** Test agreement of forward and reverse trace evaluation on
/// the fragment where both are sound, including seeded-random formulae.
mod _test_mode_agreement;

/// **(internal)** Utilities used in tests, such as building labelled line
/// graphs and traces.
mod _test_util;
