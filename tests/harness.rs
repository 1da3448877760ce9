use anyhow::{Context, Result, ensure};
use std::path::Path;

use jsonx::interpreter::Interpreter;
use jsonx::{CompileError, compile, lexer, parser};
use test_support::{Case, CaseClass, bench_workloads, load_cases, normalize_output};

fn check_error_kind(case: &Case, error: &CompileError) -> Result<()> {
    if let Some(kind) = case.spec.expected.error_kind.as_deref() {
        ensure!(
            error.kind() == kind,
            "Expected {kind} in {}, got {} ({error})",
            case.name,
            error.kind()
        );
    }
    Ok(())
}

fn run_compile_success(case: &Case, source: &str) -> Result<()> {
    let expected = case.expected_output()?;
    let output = compile(source).with_context(|| format!("Compiling {}", case.name))?;
    assert_eq!(
        normalize_output(&output),
        expected,
        "Output mismatch for {}",
        case.name
    );

    serde_json::from_str::<serde_json::Value>(&output)
        .with_context(|| format!("Output of {} is not valid JSON", case.name))?;

    let recompiled =
        compile(&output).with_context(|| format!("Recompiling output of {}", case.name))?;
    assert_eq!(recompiled, output, "Output of {} is not a fixed point", case.name);
    Ok(())
}

fn run_frontend_error(case: &Case, source: &str) -> Result<()> {
    let expected_error = case.expected_error()?;
    let error: CompileError = match lexer::tokenize(source) {
        Err(error) => error.into(),
        Ok(tokens) => match parser::parse_tokens(tokens) {
            Err(error) => error.into(),
            Ok(_) => anyhow::bail!("Expected frontend error in {}, but parsing succeeded", case.name),
        },
    };
    let actual = error.to_string();
    ensure!(
        actual.contains(&expected_error),
        "Expected frontend error containing '{expected_error}' in {}, got '{actual}'",
        case.name
    );
    check_error_kind(case, &error)
}

fn run_runtime_error(case: &Case, source: &str) -> Result<()> {
    let expected_error = case.expected_error()?;
    let tokens = lexer::tokenize(source).with_context(|| format!("Tokenizing {}", case.name))?;
    let document =
        parser::parse_tokens(tokens).with_context(|| format!("Parsing {}", case.name))?;
    let result = Interpreter::new().build(&document);
    ensure!(
        result.is_err(),
        "Expected runtime error in {}, but evaluation succeeded",
        case.name
    );
    let error = CompileError::from(result.expect_err("result checked as err"));
    let actual = error.to_string();
    ensure!(
        actual.contains(&expected_error),
        "Expected runtime error containing '{expected_error}' in {}, got '{actual}'",
        case.name
    );
    check_error_kind(case, &error)
}

#[test]
fn runs_program_cases() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;

    for case in &cases {
        let source = case.source()?;
        match case.spec.class {
            CaseClass::CompileSuccess => run_compile_success(case, &source)?,
            CaseClass::FrontendError => run_frontend_error(case, &source)?,
            CaseClass::RuntimeError => run_runtime_error(case, &source)?,
        }
    }

    Ok(())
}

#[test]
fn failing_cases_produce_no_output() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;

    for case in cases
        .iter()
        .filter(|case| case.spec.class != CaseClass::CompileSuccess)
    {
        let source = case.source()?;
        ensure!(
            compile(&source).is_err(),
            "Expected {} to fail through compile()",
            case.name
        );
    }

    Ok(())
}

#[test]
fn bench_tags_name_existing_benches() -> Result<()> {
    const BENCHES: [&str; 3] = ["frontend", "interpreter", "compile"];
    let programs = Path::new("tests/programs");

    for case in load_cases(programs)? {
        for tag in &case.spec.bench.tags {
            ensure!(
                BENCHES.contains(&tag.as_str()),
                "Case {} has unknown bench tag '{tag}'",
                case.name
            );
        }
    }
    for bench in BENCHES {
        ensure!(
            !bench_workloads(programs, bench)?.is_empty(),
            "Bench {bench} has no workloads"
        );
    }

    Ok(())
}
