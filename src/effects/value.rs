//! Magnitude resolution.
//!
//! Turns a [`Value`] into a number for one `(user, target)` pair.
//! Resolution never fails: malformed formulas resolve to 0.

use crate::core::{Actor, ResourceKind};

use super::effect::{Value, ValueKind};

/// Resolve a value, clamped to `[min, max]` when configured.
///
/// `basis` is the resource whose max is used by `percent` values.
#[must_use]
pub fn resolve(value: &Value, user: &Actor, target: &Actor, basis: ResourceKind) -> f64 {
    let raw = match &value.kind {
        ValueKind::Flat { amount } => *amount,
        ValueKind::Percent { pct } => pct * target.stats.max(basis) as f64,
        ValueKind::Formula { expr } => evaluate_formula(expr, user, target).unwrap_or(0.0),
    };

    let raw = if raw.is_finite() { raw } else { 0.0 };
    let raw = value.min.map_or(raw, |min| raw.max(min));
    value.max.map_or(raw, |max| raw.min(max))
}

/// Evaluate a formula expression.
///
/// ## Grammar
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := '-' unary | primary
/// primary := number | var | func '(' expr (',' expr)* ')' | '(' expr ')'
/// var     := ('u' | 't') '.stats.' stat
/// func    := min | max | floor | ceil | abs
/// ```
///
/// Returns `None` for malformed input, unknown names, division by zero,
/// nesting deeper than [`MAX_FORMULA_DEPTH`] or non-finite results.
#[must_use]
pub fn evaluate_formula(expr: &str, user: &Actor, target: &Actor) -> Option<f64> {
    let mut parser = FormulaParser {
        src: expr.as_bytes(),
        pos: 0,
        depth: 0,
        user,
        target,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.pos != parser.src.len() || !value.is_finite() {
        return None;
    }
    Some(value)
}

/// Deepest nesting of parentheses, calls and unary minus a formula may use.
pub const MAX_FORMULA_DEPTH: u32 = 64;

struct FormulaParser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: u32,
    user: &'a Actor,
    target: &'a Actor,
}

impl<'a> FormulaParser<'a> {
    fn skip_ws(&mut self) {
        while self.src.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Option<f64> {
        let mut acc = self.term()?;
        loop {
            if self.eat(b'+') {
                acc += self.term()?;
            } else if self.eat(b'-') {
                acc -= self.term()?;
            } else {
                return Some(acc);
            }
        }
    }

    fn term(&mut self) -> Option<f64> {
        let mut acc = self.unary()?;
        loop {
            if self.eat(b'*') {
                acc *= self.unary()?;
            } else if self.eat(b'/') {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return None;
                }
                acc /= rhs;
            } else {
                return Some(acc);
            }
        }
    }

    /// Run `f` one nesting level deeper, failing past the cap.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Option<f64>) -> Option<f64> {
        if self.depth >= MAX_FORMULA_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = f(self);
        self.depth -= 1;
        value
    }

    fn unary(&mut self) -> Option<f64> {
        if self.eat(b'-') {
            return self.nested(Self::unary).map(|v| -v);
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<f64> {
        match self.peek()? {
            b'(' => {
                self.pos += 1;
                let value = self.nested(Self::expr)?;
                self.eat(b')').then_some(value)
            }
            b'0'..=b'9' | b'.' => self.number(),
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let name = self.ident();
                if self.eat(b'(') {
                    self.nested(|p| p.call(name))
                } else {
                    self.variable(name)
                }
            }
            _ => None,
        }
    }

    fn number(&mut self) -> Option<f64> {
        let src: &'a [u8] = self.src;
        let start = self.pos;
        while self
            .src
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || *c == b'.')
        {
            self.pos += 1;
        }
        std::str::from_utf8(&src[start..self.pos]).ok()?.parse().ok()
    }

    fn ident(&mut self) -> &'a str {
        let src: &'a [u8] = self.src;
        let start = self.pos;
        while self
            .src
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_' || *c == b'.')
        {
            self.pos += 1;
        }
        std::str::from_utf8(&src[start..self.pos]).unwrap_or("")
    }

    fn call(&mut self, name: &str) -> Option<f64> {
        let mut args = vec![self.expr()?];
        while self.eat(b',') {
            args.push(self.expr()?);
        }
        if !self.eat(b')') {
            return None;
        }

        match (name, args.as_slice()) {
            ("min", [first, rest @ ..]) => Some(rest.iter().fold(*first, |a, b| a.min(*b))),
            ("max", [first, rest @ ..]) => Some(rest.iter().fold(*first, |a, b| a.max(*b))),
            ("floor", [x]) => Some(x.floor()),
            ("ceil", [x]) => Some(x.ceil()),
            ("abs", [x]) => Some(x.abs()),
            _ => None,
        }
    }

    fn variable(&self, name: &str) -> Option<f64> {
        let (actor, stat) = if let Some(stat) = name.strip_prefix("u.stats.") {
            (self.user, stat)
        } else if let Some(stat) = name.strip_prefix("t.stats.") {
            (self.target, stat)
        } else {
            return None;
        };

        let s = &actor.stats;
        let value = match stat {
            "hp" => s.hp,
            "maxHp" => s.max_hp,
            "sta" => s.sta,
            "maxSta" => s.max_sta,
            "mp" => s.mp,
            "maxMp" => s.max_mp,
            "atk" => s.atk,
            "def" => s.def,
            "lv" | "level" => s.level,
            "xp" => s.xp,
            "gold" => s.gold,
            _ => return None,
        };
        Some(value as f64)
    }
}
