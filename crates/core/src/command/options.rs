use crate::command::Command;
use crate::errors::{ConstructionError, ConstructionErrorKind, OptionParsingError};
use clap::{Arg, ArgAction};
use std::collections::HashMap;
use std::sync::Arc;

/// A command line option contributed by a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    name: String,
    description: Option<String>,
    value_name: Option<String>,
    repeatable: bool,
}

impl OptionSpec {
    /// Option without a value (`--verbose`)
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            value_name: None,
            repeatable: false,
        }
    }

    /// Option carrying a value (`--config <yaml_location>`)
    pub fn value(name: impl Into<String>, value_name: impl Into<String>) -> Self {
        Self {
            value_name: Some(value_name.into()),
            ..Self::flag(name)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Accept the option more than once, keeping every value
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value_name(&self) -> Option<&str> {
        self.value_name.as_deref()
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }
}

/// Parsed command line: selected commands, option values and the rendered help
#[derive(Debug, Clone, Default)]
pub struct ParsedOptions {
    args: Vec<String>,
    commands: Vec<String>,
    flags: Vec<String>,
    values: HashMap<String, Vec<String>>,
    help: String,
}

impl ParsedOptions {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Command names present on the command line, in contribution order
    pub fn selected_commands(&self) -> &[String] {
        &self.commands
    }

    /// Check if a flag, command or valued option was given
    pub fn has_option(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
            || self.commands.iter().any(|c| c == name)
            || self.values.contains_key(name)
    }

    /// Last value given for an option
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// All values given for an option, in command line order
    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn help(&self) -> &str {
        &self.help
    }
}

/// Turns the raw argument vector into [`ParsedOptions`]
#[derive(Debug, Clone)]
pub struct OptionParser {
    program: String,
    about: Option<String>,
}

impl OptionParser {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            about: None,
        }
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Parse `args` against every contributed command and option.
    ///
    /// Malformed input fails with the parser's own message and the
    /// `OptionParsing` kind; a name used by both a command and an option is a
    /// configuration error.
    pub fn parse(
        &self,
        args: &[String],
        commands: &[Arc<dyn Command>],
        options: &[OptionSpec],
    ) -> Result<ParsedOptions, ConstructionError> {
        let command_names: Vec<String> = commands
            .iter()
            .map(|c| c.metadata().name().to_string())
            .collect();

        if let Some(clash) = options
            .iter()
            .find(|o| command_names.iter().any(|c| c == o.name()))
        {
            return Err(ConstructionError::new(
                ConstructionErrorKind::Configuration,
                format!("Option '--{}' has the same name as a command", clash.name()),
            ));
        }

        let mut cli = clap::Command::new(self.program.clone())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true);

        if let Some(about) = &self.about {
            cli = cli.about(about.clone());
        }

        for command in commands {
            let metadata = command.metadata();
            let mut arg = Arg::new(metadata.name().to_string())
                .long(metadata.name().to_string())
                .action(ArgAction::SetTrue);
            if let Some(description) = metadata.description() {
                arg = arg.help(description.to_string());
            }
            cli = cli.arg(arg);
        }

        for option in options {
            let mut arg = Arg::new(option.name().to_string()).long(option.name().to_string());
            arg = match option.value_name() {
                Some(value_name) if option.is_repeatable() => arg
                    .value_name(value_name.to_string())
                    .action(ArgAction::Append),
                Some(value_name) => arg.value_name(value_name.to_string()).action(ArgAction::Set),
                None => arg.action(ArgAction::SetTrue),
            };
            if let Some(description) = option.description() {
                arg = arg.help(description.to_string());
            }
            cli = cli.arg(arg);
        }

        let help = cli.render_help().to_string();

        let matches = cli
            .try_get_matches_from_mut(args.iter())
            .map_err(|e| OptionParsingError::new(e.to_string().trim_end()))?;

        let selected = command_names
            .into_iter()
            .filter(|name| matches.get_flag(name))
            .collect();

        let mut flags = Vec::new();
        let mut values = HashMap::new();
        for option in options {
            if option.value_name().is_some() {
                if let Some(given) = matches.get_many::<String>(option.name()) {
                    values.insert(option.name().to_string(), given.cloned().collect());
                }
            } else if matches.get_flag(option.name()) {
                flags.push(option.name().to_string());
            }
        }

        Ok(ParsedOptions {
            args: args.to_vec(),
            commands: selected,
            flags,
            values,
            help,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandContext, CommandMetadata, CommandOutcome, HelpCommand};
    use crate::errors::CommandExecutionError;

    struct ServeCommand;

    impl Command for ServeCommand {
        fn metadata(&self) -> CommandMetadata {
            CommandMetadata::new("serve").with_description("Starts the server.")
        }

        fn run(&self, _: &CommandContext<'_>) -> Result<CommandOutcome, CommandExecutionError> {
            Ok(CommandOutcome::ok())
        }
    }

    fn commands() -> Vec<Arc<dyn Command>> {
        vec![
            Arc::new(HelpCommand) as Arc<dyn Command>,
            Arc::new(ServeCommand),
        ]
    }

    fn options() -> Vec<OptionSpec> {
        vec![
            OptionSpec::value("config", "yaml_location").repeatable(),
            OptionSpec::flag("verbose"),
        ]
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands_and_options() {
        let parsed = OptionParser::new("app")
            .parse(
                &args(&["--serve", "--config", "a.yml", "--config=b.yml", "--verbose"]),
                &commands(),
                &options(),
            )
            .unwrap();

        assert_eq!(parsed.selected_commands().to_vec(), vec!["serve".to_string()]);
        assert_eq!(parsed.values("config").to_vec(), vec!["a.yml", "b.yml"]);
        assert_eq!(parsed.value("config"), Some("b.yml"));
        assert!(parsed.has_option("verbose"));
        assert!(parsed.help().contains("--serve"));
        assert!(parsed.help().contains("Starts the server."));
    }

    #[test]
    fn test_unknown_option_reports_parser_message() {
        let error = OptionParser::new("app")
            .parse(&args(&["--bogus"]), &commands(), &options())
            .unwrap_err();

        assert!(error.is_option_parsing());
        assert!(error.message().contains("--bogus"));
    }

    #[test]
    fn test_name_clash_is_configuration_error() {
        let error = OptionParser::new("app")
            .parse(&[], &commands(), &[OptionSpec::flag("serve")])
            .unwrap_err();

        assert_eq!(error.kind(), ConstructionErrorKind::Configuration);
    }

    #[test]
    fn test_help_flag_is_a_command() {
        let parsed = OptionParser::new("app")
            .parse(&args(&["--help"]), &commands(), &options())
            .unwrap();

        assert_eq!(parsed.selected_commands().to_vec(), vec!["help".to_string()]);
    }
}
