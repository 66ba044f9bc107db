use std::iter::Peekable;

use tracing::warn;

use super::Flags;
use super::registry::{Binding, FlagSet};
use crate::error::{ConfigError, ConfigResult};

impl FlagSet {
    /// Parse `args` (without the program name) into [`Flags`].
    ///
    /// Flag parsing stops at `--` or at the first argument that is not a
    /// flag. Whatever follows is rejected, the agent takes no positional
    /// arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first bad argument. No
    /// partial result is returned.
    pub fn parse<S: AsRef<str>>(&self, args: &[S]) -> ConfigResult<Flags> {
        let mut flags = Flags::default();
        let mut args = args.iter().map(|a| a.as_ref()).peekable();

        while let Some(arg) = args.next() {
            let Some(body) = arg.strip_prefix('-').filter(|b| !b.is_empty()) else {
                return Err(ConfigError::UnexpectedArgument {
                    arg: arg.to_owned(),
                });
            };

            let spec_text = match body.strip_prefix('-') {
                // `--` terminates the flags.
                Some("") => {
                    return match args.next() {
                        Some(extra) => Err(ConfigError::UnexpectedArgument {
                            arg: extra.to_owned(),
                        }),
                        None => {
                            flags.apply_deprecations();
                            Ok(flags)
                        },
                    };
                },
                Some(rest) => rest,
                None => body,
            };

            if spec_text.is_empty() || spec_text.starts_with(['-', '=']) {
                return Err(ConfigError::BadFlagSyntax {
                    arg: arg.to_owned(),
                });
            }

            let (name, inline_value) = match spec_text.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (spec_text, None),
            };

            let Some(spec) = self.lookup(name) else {
                if name == "h" || name == "help" {
                    return Err(ConfigError::HelpRequested);
                }
                return Err(ConfigError::UnknownFlag {
                    name: name.to_owned(),
                });
            };

            if spec.deprecated {
                warn!(flag = name, "deprecated flag");
            }

            match spec.binding {
                Binding::Bool(field) => {
                    let value = match inline_value {
                        Some(v) => parse_bool(v).ok_or_else(|| ConfigError::InvalidFlagValue {
                            name: name.to_owned(),
                            value: v.to_owned(),
                            message: "expected a boolean".to_owned(),
                        })?,
                        None => bool_operand(&mut args),
                    };
                    *field(&mut flags) = Some(value);
                },
                Binding::Int(field) => {
                    let v = required_value(name, inline_value, &mut args)?;
                    let n = v
                        .parse::<i64>()
                        .map_err(|e| invalid_value(name, v, &e))?;
                    *field(&mut flags) = Some(n);
                },
                Binding::Duration(field) => {
                    let v = required_value(name, inline_value, &mut args)?;
                    let d = humantime::parse_duration(v).map_err(|e| invalid_value(name, v, &e))?;
                    *field(&mut flags) = Some(d);
                },
                Binding::Str(field) => {
                    let v = required_value(name, inline_value, &mut args)?;
                    *field(&mut flags) = Some(v.to_owned());
                },
                Binding::List(field) => {
                    let v = required_value(name, inline_value, &mut args)?;
                    field(&mut flags).push(v.to_owned());
                },
                Binding::Map(field) => {
                    let v = required_value(name, inline_value, &mut args)?;
                    let Some((key, value)) = v.split_once(':') else {
                        return Err(ConfigError::InvalidFlagValue {
                            name: name.to_owned(),
                            value: v.to_owned(),
                            message: "expected key:value".to_owned(),
                        });
                    };
                    field(&mut flags).insert(key.to_owned(), value.to_owned());
                },
            }
        }

        flags.apply_deprecations();
        Ok(flags)
    }
}

/// Parse a boolean literal. Accepts `1 t T TRUE true True` and
/// `0 f F FALSE false False`.
pub(super) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Value of a boolean flag given without `=`. The next argument is consumed
/// only when it is a boolean literal; otherwise it is left in place and the
/// flag is true.
fn bool_operand<'a, I>(args: &mut Peekable<I>) -> bool
where
    I: Iterator<Item = &'a str>,
{
    match args.peek().and_then(|next| parse_bool(next)) {
        Some(value) => {
            args.next();
            value
        },
        None => true,
    }
}

/// Value of a non-boolean flag: the inline `=value`, or the next argument.
fn required_value<'a, I>(
    name: &str,
    inline_value: Option<&'a str>,
    args: &mut Peekable<I>,
) -> ConfigResult<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    if let Some(v) = inline_value {
        return Ok(v);
    }
    args.next().ok_or_else(|| ConfigError::MissingFlagValue {
        name: name.to_owned(),
    })
}

fn invalid_value(name: &str, value: &str, err: &dyn std::fmt::Display) -> ConfigError {
    ConfigError::InvalidFlagValue {
        name: name.to_owned(),
        value: value.to_owned(),
        message: err.to_string(),
    }
}
