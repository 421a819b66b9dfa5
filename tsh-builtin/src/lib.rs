// This file is part of tsh, a tiny shell with job control.
// Copyright (C) 2026 WATANABE Yuki
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Implementation of the tsh built-in utilities.
//!
//! Each built-in utility is implemented in the submodule named after the
//! utility. The submodule contains the `main` function that implements the
//! built-in utility. The [`common`] module provides the job selection shared
//! by `bg` and `fg`.
//!
//! Built-in utilities write their messages, including error messages, to the
//! standard output.

pub mod bg;
pub mod common;
pub mod fg;
pub mod jobs;
pub mod quit;

#[doc(no_inline)]
pub use tsh_env::builtin::*;

use tsh_env::Env;

/// Array of all the implemented built-in utilities.
///
/// The array items are ordered alphabetically.
pub const BUILTINS: &[(&str, Builtin)] = &[
    ("bg", Builtin { execute: bg::main }),
    ("fg", Builtin { execute: fg::main }),
    ("jobs", Builtin { execute: jobs::main }),
    ("quit", Builtin { execute: quit::main }),
];

/// Adds all the built-ins in [`BUILTINS`] to the environment.
pub fn install(env: &mut Env) {
    env.builtins.extend(BUILTINS.iter().copied());
}
