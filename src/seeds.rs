//! Built-in template pools. These make the generator useful without any config,
//! and supply the fallback choices the controller shows for predict/fix questions.

use crate::domain::{Category, Difficulty};
use crate::generator::{Concept, Pools, SpotErrorTemplate};

/// Outputs drawn for the displayed predict-output choices.
pub const DISPLAY_OUTPUTS: [&str; 8] = ["Some(10)", "None", "Panic", "Error", "42", "\"hello\"", "true", "false"];

/// Starting tokens for the displayed fix-syntax choices.
pub const DISPLAY_FIXES: [&str; 4] = ["&mut", "&", "*", "ref"];

pub fn default_concepts() -> Vec<Concept> {
  use Category::*;
  use Difficulty::*;
  [
    (Basics, Easy),
    (Ownership, Medium),
    (Borrowing, Medium),
    (Lifetimes, Hard),
    (Structs, Easy),
    (Enums, Medium),
    (Traits, Medium),
    (Generics, Hard),
    (ErrorHandling, Medium),
    (Concurrency, Hard),
  ]
  .into_iter()
  .map(|(category, difficulty)| Concept { category, difficulty })
  .collect()
}

pub fn default_spot_errors() -> Vec<SpotErrorTemplate> {
  [
    (3, "Use of moved value", "value used here after move"),
    (4, "Cannot borrow as mutable", "cannot borrow as mutable"),
    (2, "Mismatched types", "mismatched types"),
    (3, "Expected struct", "expected struct"),
    (4, "Borrowed value does not live long enough", "borrowed value does not live long enough"),
    (2, "Missing lifetime specifier", "missing lifetime specifier"),
    (3, "Cannot mutate immutable variable", "cannot mutate immutable variable"),
    (4, "Trait bound not satisfied", "trait bound not satisfied"),
    (2, "Expected identifier", "expected identifier"),
    (3, "Cannot borrow immutable variable as mutable", "cannot borrow immutable variable as mutable"),
  ]
  .into_iter()
  .map(|(line, error, reason)| SpotErrorTemplate { line, error: error.into(), reason: reason.into() })
  .collect()
}

// Snippets are stored as one string per template and split on '\n' at generation time.
const SPOT_SNIPPETS: [&str; 10] = [
  "fn main() {\n    let x = 5;\n    let y = x;\n    println!(\"{}\", x);\n}",
  "fn main() {\n    let mut s = String::from(\"hello\");\n    let r = &s;\n    r.push_str(\" world\");\n}",
  "fn main() {\n    let x = 42;\n    let y = &x as *const i32;\n    unsafe { println!(\"{}\", *y); }\n}",
  "fn main() {\n    let s1 = String::from(\"test\");\n    let s2 = s1;\n    println!(\"{}\", s1);\n}",
  "fn main() {\n    let x = 10;\n    let y = &mut x;\n    println!(\"{}\", x);\n}",
  "fn main() {\n    let x = 5;\n    let y = &x;\n    println!(\"{}\", y);\n}",
  "fn main() {\n    let x = 42;\n    let y = &x;\n    println!(\"{}\", *y);\n}",
  "fn main() {\n    let s = String::from(\"hello\");\n    let r = &s;\n    drop(s);\n    println!(\"{}\", r);\n}",
  "fn main() {\n    let x = 10;\n    let y = &x;\n    let z = &mut x;\n    println!(\"{}\", x);\n}",
  "fn main() {\n    let x = 5;\n    let y = &x;\n    println!(\"{}\", *y);\n}",
];

const PREDICT_SNIPPETS: [&str; 10] = [
  "fn main() {\n    let x = 5;\n    let y = x + 5;\n    println!(\"{}\", y);\n}",
  "fn main() {\n    let s = String::from(\"hello\");\n    println!(\"{}\", s);\n}",
  "fn main() {\n    let x = Some(10);\n    println!(\"{:?}\", x);\n}",
  "fn main() {\n    let x = 42;\n    println!(\"{}\", x);\n}",
  "fn main() {\n    let x = 5;\n    let y = &x;\n    println!(\"{}\", *y);\n}",
  "fn main() {\n    let s = String::from(\"test\");\n    let r = &s;\n    println!(\"{}\", r);\n}",
  "fn main() {\n    let x = 10;\n    let y = x * 2;\n    println!(\"{}\", y);\n}",
  "fn main() {\n    let x = true;\n    println!(\"{}\", x);\n}",
  "fn main() {\n    let x: Option<i32> = None;\n    println!(\"{:?}\", x);\n}",
  "fn main() {\n    let x: i32 = 3;\n    let y = x.pow(2);\n    println!(\"{}\", y);\n}",
];

const FIX_SNIPPETS: [&str; 10] = [
  "fn main() {\n    let x = 5;\n    let y = &x;\n    println!(\"{}\", *y);\n}",
  "fn main() {\n    let mut s = String::from(\"hello\");\n    let r = &s;\n    r.push_str(\" world\");\n}",
  "fn main() {\n    let x = 42;\n    let y = &x as *const i32;\n    unsafe { println!(\"{}\", *y); }\n}",
  "fn main() {\n    let s1 = String::from(\"test\");\n    let s2 = s1;\n    println!(\"{}\", s2);\n}",
  "fn main() {\n    let x = 10;\n    let y = &mut x;\n    println!(\"{}\", x);\n}",
  "fn main() {\n    let x = 5;\n    let y = &x;\n    println!(\"{}\", y);\n}",
  "fn main() {\n    let x = 42;\n    let y = &x;\n    println!(\"{}\", *y);\n}",
  "fn main() {\n    let s = String::from(\"hello\");\n    let r = &s;\n    drop(s);\n    println!(\"{}\", r);\n}",
  "fn main() {\n    let x = 10;\n    let y = &x;\n    let z = &mut x;\n    println!(\"{}\", x);\n}",
  "fn main() {\n    let x = 5;\n    let y = &x;\n    println!(\"{}\", *y);\n}",
];

const OUTPUTS: [&str; 10] = ["42", "\"hello\"", "Some(10)", "None", "true", "false", "5", "10", "Panic", "Error"];

const FIXES: [&str; 8] = ["&mut", "&", "*", "ref", "clone()", "to_string()", "as_str()", "into()"];

fn owned(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// The full default pool set used when no config overrides are present.
pub fn default_pools() -> Pools {
  Pools {
    concepts: default_concepts(),
    spot_errors: default_spot_errors(),
    spot_snippets: owned(&SPOT_SNIPPETS),
    predict_snippets: owned(&PREDICT_SNIPPETS),
    outputs: owned(&OUTPUTS),
    fix_snippets: owned(&FIX_SNIPPETS),
    fixes: owned(&FIXES),
  }
}
