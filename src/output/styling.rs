use console::style;

/// Styling helpers for terminal output
pub fn bright_magenta(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().magenta()
}

pub fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn grey(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().black()
}
