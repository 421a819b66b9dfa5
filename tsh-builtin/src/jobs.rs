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

//! Jobs built-in
//!
//! The **`jobs`** built-in prints a [`Report`] line for each job in the job
//! list, ordered by job number. Operands are ignored.

use std::fmt::Write as _;
use std::ops::ControlFlow::Continue;
use tsh_env::job::fmt::Report;
use tsh_env::semantics::Result;
use tsh_env::Env;

/// Entry point of the `jobs` built-in
pub fn main(env: &mut Env, _args: Vec<String>) -> Result {
    let mut print = String::new();
    for job in env.jobs.list() {
        // Writing to a string never fails.
        writeln!(print, "{}", Report(job)).ok();
    }
    env.print(&print);
    Continue(())
}
