use std::path::Path;

use crate::{
    config::ValidatorConfig,
    errors::{ValidatorError, ValidatorResult},
};

/// Builds the arguments the validator binary is invoked with.
///
/// `<binary> --quiet -C <config> --ledger <dir> [-r] --limit-ledger-size <n>
/// [--bpf-program <id> <path>]* [--account <id> <path>]*`
pub fn build_validator_args(
    config: &ValidatorConfig,
    config_path: &Path,
    account_args: impl IntoIterator<Item = String>,
) -> ValidatorResult<Vec<String>> {
    let mut args = vec![
        "--quiet".to_string(),
        "-C".to_string(),
        config_path.to_string_lossy().to_string(),
        "--ledger".to_string(),
        config.ledger_dir.to_string_lossy().to_string(),
    ];
    if config.reset_ledger {
        args.push("-r".to_string());
    }
    args.push("--limit-ledger-size".to_string());
    args.push(config.limit_ledger_size.to_string());

    for program in &config.programs {
        if !program.deploy_path.exists() {
            return Err(ValidatorError::ProgramNotAccessible(
                program.deploy_path.to_string_lossy().to_string(),
            ));
        }
        args.push("--bpf-program".to_string());
        args.push(program.program_id.clone());
        args.push(program.deploy_path.to_string_lossy().to_string());
    }

    args.extend(account_args);
    Ok(args)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::ProgramConfig;

    fn config() -> ValidatorConfig {
        ValidatorConfig {
            ledger_dir: PathBuf::from("/tmp/ledger"),
            ..ValidatorConfig::default()
        }
    }

    #[test]
    fn test_args_without_programs_and_accounts() {
        let args =
            build_validator_args(&config(), Path::new("/tmp/c.yml"), vec![])
                .unwrap();
        assert_eq!(
            args,
            vec![
                "--quiet",
                "-C",
                "/tmp/c.yml",
                "--ledger",
                "/tmp/ledger",
                "-r",
                "--limit-ledger-size",
                "10000"
            ]
        );
    }

    #[test]
    fn test_args_with_programs_and_accounts() {
        let deploy_path = tempfile::NamedTempFile::new().unwrap();
        let deploy = deploy_path.path().to_string_lossy().to_string();
        let config = ValidatorConfig {
            reset_ledger: false,
            limit_ledger_size: 5,
            programs: vec![ProgramConfig {
                label: None,
                program_id: "prog".to_string(),
                deploy_path: deploy_path.path().to_path_buf(),
            }],
            ..config()
        };
        let accounts = vec![
            "--account".to_string(),
            "acc".to_string(),
            "/tmp/acc.json".to_string(),
        ];
        let args =
            build_validator_args(&config, Path::new("/tmp/c.yml"), accounts)
                .unwrap();
        assert_eq!(
            args,
            vec![
                "--quiet",
                "-C",
                "/tmp/c.yml",
                "--ledger",
                "/tmp/ledger",
                "--limit-ledger-size",
                "5",
                "--bpf-program",
                "prog",
                deploy.as_str(),
                "--account",
                "acc",
                "/tmp/acc.json"
            ]
        );
    }

    #[test]
    fn test_inaccessible_program() {
        let config = ValidatorConfig {
            programs: vec![ProgramConfig {
                label: None,
                program_id: "prog".to_string(),
                deploy_path: PathBuf::from("/does/not/exist.so"),
            }],
            ..config()
        };
        assert!(matches!(
            build_validator_args(&config, Path::new("/tmp/c.yml"), vec![]),
            Err(ValidatorError::ProgramNotAccessible(_))
        ));
    }
}
