use crate::config::Args;
use clap::CommandFactory;
use clap_complete::Shell;

const CONFIG_TEMPLATE: &str = include_str!("../vigil-config-sample.toml");

/// Something vigil can write to stdout instead of monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    ConfigTemplate,
    ShellCompletions(Shell),
    ManPage,
}

impl Artifact {
    /// Render the artifact as text.
    pub fn render(self) -> anyhow::Result<String> {
        let mut cmd = Args::command();
        let mut buffer: Vec<u8> = vec![];
        match self {
            Self::ConfigTemplate => return Ok(String::from(CONFIG_TEMPLATE)),
            Self::ShellCompletions(shell) => {
                let name = cmd.get_name().to_string();
                clap_complete::generate(shell, &mut cmd, name, &mut buffer);
            }
            Self::ManPage => clap_mangen::Man::new(cmd).render(&mut buffer)?,
        }
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Shell::Bash, "--report-interval"; "bash")]
    #[test_case(Shell::Elvish, "--report-interval"; "elvish")]
    #[test_case(Shell::Fish, "report-interval"; "fish")]
    #[test_case(Shell::PowerShell, "--report-interval"; "powershell")]
    #[test_case(Shell::Zsh, "--report-interval"; "zsh")]
    fn test_shell_completions(shell: Shell, expected: &str) {
        let completions = Artifact::ShellCompletions(shell).render().unwrap();
        assert!(completions.contains("vigil"));
        assert!(completions.contains(expected));
    }

    #[test]
    fn test_man_page() {
        let page = Artifact::ManPage.render().unwrap();
        assert!(page.contains(".TH"));
        assert!(page.contains("vigil"));
        assert!(page.contains("stop"));
    }

    #[test]
    fn test_config_template_has_every_section() {
        let template = Artifact::ConfigTemplate.render().unwrap();
        for section in ["[vigil]", "[probe]", "[report]"] {
            assert!(template.contains(section), "missing {section}");
        }
    }
}
