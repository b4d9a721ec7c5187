//! Operator command catalog expressed as a small declarative grammar.
//!
//! The parser and the help output read the same structure, so keywords,
//! argument layouts, and usage strings cannot drift apart.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandTag {
    Press,
    Hold,
    Release,
    Input,
    Wait,
    Signal,
    Duplicate,
    Remove,
    Status,
    Log,
    Help,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoiceTag {
    SignalLimit,
    SignalCompleted,
    SignalIncomplete,
    On,
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub tag: CommandTag,
    pub grammar: &'static Node,
    pub usage: &'static str,
    pub summary: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    End,
    /// Button id literal.
    Button {
        optional: bool,
        next: &'static Node,
    },
    /// Duration literal such as `250ms` or `2s`.
    Duration { next: &'static Node },
    /// Quoted text or a single bare word.
    Text { next: &'static Node },
    /// One keyword out of a fixed set.
    Choice {
        label: &'static str,
        choices: &'static [ChoiceBranch],
        next: &'static Node,
    },
    /// Optional help topic.
    Topic { next: &'static Node },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChoiceBranch {
    pub keyword: &'static str,
    pub tag: ChoiceTag,
}

const END: Node = Node::End;

const BUTTON: Node = Node::Button {
    optional: false,
    next: &END,
};

const OPTIONAL_BUTTON: Node = Node::Button {
    optional: true,
    next: &END,
};

const INPUT_TEXT: Node = Node::Text { next: &END };

const INPUT_GRAMMAR: Node = Node::Button {
    optional: false,
    next: &INPUT_TEXT,
};

const WAIT_GRAMMAR: Node = Node::Duration { next: &END };

const SWITCH_CHOICES: [ChoiceBranch; 2] = [
    ChoiceBranch {
        keyword: "on",
        tag: ChoiceTag::On,
    },
    ChoiceBranch {
        keyword: "off",
        tag: ChoiceTag::Off,
    },
];

const SWITCH: Node = Node::Choice {
    label: "on|off",
    choices: &SWITCH_CHOICES,
    next: &END,
};

const SIGNAL_CHOICES: [ChoiceBranch; 3] = [
    ChoiceBranch {
        keyword: "limit",
        tag: ChoiceTag::SignalLimit,
    },
    ChoiceBranch {
        keyword: "completed",
        tag: ChoiceTag::SignalCompleted,
    },
    ChoiceBranch {
        keyword: "incomplete",
        tag: ChoiceTag::SignalIncomplete,
    },
];

const SIGNAL_GRAMMAR: Node = Node::Choice {
    label: "limit|completed|incomplete",
    choices: &SIGNAL_CHOICES,
    next: &SWITCH,
};

const HELP_GRAMMAR: Node = Node::Topic { next: &END };

const COMMANDS: [CommandSpec; 11] = [
    CommandSpec {
        name: "press",
        tag: CommandTag::Press,
        grammar: &BUTTON,
        usage: "press <id>",
        summary: "run a press on a button",
    },
    CommandSpec {
        name: "hold",
        tag: CommandTag::Hold,
        grammar: &BUTTON,
        usage: "hold <id>",
        summary: "begin a long-press gesture",
    },
    CommandSpec {
        name: "release",
        tag: CommandTag::Release,
        grammar: &BUTTON,
        usage: "release <id>",
        summary: "end a long-press gesture",
    },
    CommandSpec {
        name: "input",
        tag: CommandTag::Input,
        grammar: &INPUT_GRAMMAR,
        usage: "input <id> \"<text>\"",
        summary: "set the pending input value",
    },
    CommandSpec {
        name: "wait",
        tag: CommandTag::Wait,
        grammar: &WAIT_GRAMMAR,
        usage: "wait <duration>",
        summary: "advance the clock (e.g. 250ms, 2s)",
    },
    CommandSpec {
        name: "signal",
        tag: CommandTag::Signal,
        grammar: &SIGNAL_GRAMMAR,
        usage: "signal <limit|completed|incomplete> <on|off>",
        summary: "toggle an external data signal",
    },
    CommandSpec {
        name: "duplicate",
        tag: CommandTag::Duplicate,
        grammar: &BUTTON,
        usage: "duplicate <id>",
        summary: "duplicate a button with fresh state",
    },
    CommandSpec {
        name: "remove",
        tag: CommandTag::Remove,
        grammar: &BUTTON,
        usage: "remove <id>",
        summary: "remove a button and cancel its work",
    },
    CommandSpec {
        name: "status",
        tag: CommandTag::Status,
        grammar: &OPTIONAL_BUTTON,
        usage: "status [<id>]",
        summary: "show presentation and runtime state",
    },
    CommandSpec {
        name: "log",
        tag: CommandTag::Log,
        grammar: &END,
        usage: "log",
        summary: "show the structured log window",
    },
    CommandSpec {
        name: "help",
        tag: CommandTag::Help,
        grammar: &HELP_GRAMMAR,
        usage: "help [<command>]",
        summary: "show help",
    },
];

/// Returns the full command catalog.
#[must_use]
pub const fn commands() -> &'static [CommandSpec] {
    &COMMANDS
}

/// Finds a command by name (case insensitive).
#[must_use]
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_is_reachable_by_name() {
        for spec in commands() {
            assert_eq!(find(spec.name).map(|found| found.tag), Some(spec.tag));
            assert!(spec.usage.starts_with(spec.name));
        }
        assert_eq!(find("PRESS").map(|spec| spec.tag), Some(CommandTag::Press));
        assert!(find("reboot").is_none());
    }
}
