//! Built-in challenge bank and the runtime catalog.
//!
//! The catalog is assembled once at startup (built-ins plus any config-bank
//! entries) and is read-only afterwards. Within a track, challenge ids are
//! unique and order is the presentation order.

use std::collections::HashMap;

use crate::domain::{Challenge, Difficulty, Track};

/// Ordered challenge sequences per track, fixed after construction.
pub struct Catalog {
  by_track: HashMap<Track, Vec<Challenge>>,
  total: usize,
}

impl Catalog {
  /// Build from the built-in bank plus extra entries (config bank).
  /// Extra entries are appended after the built-ins of their track;
  /// an entry whose id already exists in its track is dropped.
  pub fn new(extra: Vec<Challenge>) -> Self {
    let mut by_track: HashMap<Track, Vec<Challenge>> = HashMap::new();
    for t in Track::ALL {
      by_track.insert(t, Vec::new());
    }
    for c in builtin_challenges().into_iter().chain(extra) {
      let list = by_track.entry(c.track).or_default();
      if list.iter().any(|e| e.id == c.id) {
        tracing::warn!(target: "challenge", id = %c.id, track = %c.track, "Duplicate challenge id dropped");
        continue;
      }
      list.push(c);
    }
    let total = by_track.values().map(Vec::len).sum();
    Self { by_track, total }
  }

  /// The fixed ordered sequence for a track. Every declared track has one.
  pub fn challenges(&self, track: Track) -> &[Challenge] {
    self.by_track.get(&track).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn track_len(&self, track: Track) -> usize {
    self.challenges(track).len()
  }

  /// Total challenge count across all tracks (the manual-finalize gate).
  pub fn total(&self) -> usize {
    self.total
  }
}

fn ch(
  id: &str,
  track: Track,
  title: &str,
  difficulty: Difficulty,
  code: &str,
  instruction: &str,
  bug_line: u32,
  hint: &str,
  accepted: &[&str],
) -> Challenge {
  Challenge {
    id: id.into(),
    track,
    title: title.into(),
    difficulty,
    code: code.into(),
    instruction: instruction.into(),
    bug_line,
    hint: hint.into(),
    accepted: accepted.iter().map(|s| s.to_string()).collect(),
  }
}

/// The full built-in bank: 6 python, 6 javascript, 5 java, 5 cpp, 5 go.
/// Java/cpp/go entries carry no accepted patterns; any non-empty answer
/// passes there (the defect is described, not typed back verbatim).
pub fn builtin_challenges() -> Vec<Challenge> {
  use Difficulty::{Easy, Hard, Medium, Tough};
  use Track::{Cpp, Go, Java, Javascript, Python};

  vec![
    // python
    ch(
      "PY01", Python, "List Summation", Easy,
      "def sum_list(items):\n    total = 0\n    for i in range(len(items) + 1):\n        total += items[i]\n    return total",
      "The function crashes when calculating the sum. Fix the range logic.",
      3, "Check the range upper bound.",
      &["range(len(items))", "for i in range(len(items)):"],
    ),
    ch(
      "PY02", Python, "Dictionary Access", Easy,
      "def get_user_age(data, name):\n    return data.name",
      "The function fails to retrieve the value from the dictionary using the variable.",
      2, "Use bracket notation for dynamic keys.",
      &["data[name]", "return data[name]"],
    ),
    ch(
      "PY03", Python, "Factorial Recursion", Medium,
      "def factorial(n):\n    if n == 0: return 1\n    return n * factorial(n)",
      "The function causes a RecursionError. Fix the recursive call.",
      3, "The input to the next call should be smaller.",
      &["factorial(n-1)", "factorial(n - 1)"],
    ),
    ch(
      "PY04", Python, "String Formatting", Medium,
      "def greet(name):\n    return \"Hello {name}\"",
      "The string is not interpolating the variable correctly.",
      2, "Python 3 f-strings start with a specific letter.",
      &["f\"hello {name}\"", "f'hello {name}'"],
    ),
    ch(
      "PY05", Python, "Class Method", Hard,
      "class Counter:\n    def __init__(self):\n        self.count = 0\n    def increment():\n        self.count += 1",
      "The increment method fails when called on an instance.",
      4, "All instance methods need a specific first argument.",
      &["def increment(self):", "increment(self)"],
    ),
    ch(
      "PY06", Python, "Mutable Default Trap", Tough,
      "def add_item(item, items=[]):\n    items.append(item)\n    return items",
      "Fix the shared default list bug (should not persist between calls).",
      1, "Use None default + initialize inside.",
      &["items=None", "if items is none:", "items = []"],
    ),
    // javascript (lenient track: accepted patterns kept for reference only)
    ch(
      "JS01", Javascript, "Array Iteration", Easy,
      "function calculateTotal(items) {\n  let total = 0;\n  for (let i = 0; i <= items.length; i++) {\n    total += items[i].price;\n  }\n  return total;\n}",
      "Fix the off-by-one error in the loop condition.",
      3, "Arrays are 0-indexed.",
      &["i < items.length", "i < items.length;"],
    ),
    ch(
      "JS02", Javascript, "Scope Issue", Easy,
      "function createTimers() {\n  for (var i = 0; i < 3; i++) {\n    setTimeout(() => console.log(i), 100);\n  }\n}",
      "The function prints '3, 3, 3' instead of '0, 1, 2'. Fix the variable declaration.",
      2, "Var has function scope, try block scope.",
      &["for (let i = 0", "let i = 0"],
    ),
    ch(
      "JS03", Javascript, "Async Await", Medium,
      "async function fetchData() {\n  const res = fetch('/api/data');\n  return res.json();\n}",
      "The function returns a promise instead of the JSON data.",
      2, "Don't forget to wait for the network request.",
      &["await fetch", "const res = await fetch"],
    ),
    ch(
      "JS04", Javascript, "Deep Equality", Medium,
      "const compare = (a, b) => a == b;\n// fails for compare([], [])",
      "Strict equality check required for primitives.",
      1, "Use the triple equals operator.",
      &["a === b"],
    ),
    ch(
      "JS05", Javascript, "Object Context", Hard,
      "const obj = {\n  val: 10,\n  getVal: () => this.val\n};",
      "The arrow function is using the wrong 'this' context.",
      3, "Arrow functions don't have their own 'this'.",
      &["getval() {", "getval: function", "function ()"],
    ),
    ch(
      "JS06", Javascript, "Promise Chain Return", Tough,
      "function getJson(url) {\n  fetch(url)\n    .then(res => res.json())\n    .then(data => data)\n}",
      "The function should return the promise so callers can await it.",
      1, "Return the fetch chain.",
      &["return fetch", "return fetch(url)"],
    ),
    // java
    ch(
      "JV01", Java, "String Comparison", Easy,
      "public boolean check(String s) {\n  return s == \"admin\";\n}",
      "The comparison fails even when the string is 'admin'.",
      2, "Strings are objects in Java.",
      &[],
    ),
    ch(
      "JV02", Java, "Null Pointer", Easy,
      "String name = null;\nint len = name.length();",
      "Identify why the program crashes.",
      2, "You cannot call methods on null.",
      &[],
    ),
    ch(
      "JV03", Java, "Array Bounds", Medium,
      "int[] arr = {1, 2, 3};\nfor(int i=0; i<4; i++) {\n  System.out.println(arr[i]);\n}",
      "The loop goes past the end of the array.",
      2, "Array length is 3.",
      &[],
    ),
    ch(
      "JV04", Java, "Constructor Logic", Medium,
      "class User {\n  String id;\n  User(String id) {\n    id = id;\n  }\n}",
      "The instance variable is not being assigned.",
      4, "Use 'this' to refer to instance variables.",
      &[],
    ),
    ch(
      "JV05", Java, "Static Access", Hard,
      "class Main {\n  int x = 5;\n  public static void main(String[] args) {\n    System.out.println(x);\n  }\n}",
      "Static methods cannot access instance variables directly.",
      4, "Make x static or create an instance.",
      &[],
    ),
    // cpp
    ch(
      "CP01", Cpp, "Semicolon Missing", Easy,
      "int x = 10\ncout << x << endl;",
      "The code fails to compile.",
      1, "Every statement needs a terminator.",
      &[],
    ),
    ch(
      "CP02", Cpp, "Pointer Dereference", Easy,
      "int x = 5;\nint* p = x;\ncout << *p;",
      "The pointer assignment is incorrect.",
      2, "Pointers store memory addresses.",
      &[],
    ),
    ch(
      "CP03", Cpp, "Infinite Loop", Medium,
      "for(int i=10; i>0; i++) {\n  // do something\n}",
      "The loop condition or increment is wrong.",
      1, "i will always be greater than 0 if you increment.",
      &[],
    ),
    ch(
      "CP04", Cpp, "Vector Access", Medium,
      "vector<int> v = {1};\ncout << v[2];",
      "Accessing an out-of-bounds index.",
      2, "Check the size of the vector.",
      &[],
    ),
    ch(
      "CP05", Cpp, "Memory Leak", Hard,
      "void func() {\n  int* p = new int[10];\n  // return without cleanup\n}",
      "Identify the missing cleanup step.",
      2, "Everything 'new' must be 'deleted'.",
      &[],
    ),
    // go
    ch(
      "GO01", Go, "Short Declaration", Easy,
      "var x int = 10\nx := 20",
      "Cannot use short declaration for existing variable.",
      2, "Use simple assignment (=).",
      &[],
    ),
    ch(
      "GO02", Go, "Nil Map", Easy,
      "var m map[string]int\nm[\"key\"] = 1",
      "Assignment to entry in nil map.",
      2, "Initialize the map with make().",
      &[],
    ),
    ch(
      "GO03", Go, "Unused Variable", Medium,
      "func main() {\n  x := 10\n  fmt.Println(\"Hello\")\n}",
      "Go compiler fails if a variable is declared but not used.",
      2, "Use the variable or remove it.",
      &[],
    ),
    ch(
      "GO04", Go, "Slice Header", Medium,
      "s := []int{1, 2}\ns[2] = 3",
      "Index out of range.",
      2, "Use append() to grow slices.",
      &[],
    ),
    ch(
      "GO05", Go, "Goroutine Sync", Hard,
      "func main() {\n  go fmt.Println(\"Wait\")\n}",
      "The program exits before the goroutine finishes.",
      2, "Use WaitGroups or channels to sync.",
      &[],
    ),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_bank_shape() {
    let cat = Catalog::new(Vec::new());
    assert_eq!(cat.track_len(Track::Python), 6);
    assert_eq!(cat.track_len(Track::Javascript), 6);
    assert_eq!(cat.track_len(Track::Java), 5);
    assert_eq!(cat.track_len(Track::Cpp), 5);
    assert_eq!(cat.track_len(Track::Go), 5);
    assert_eq!(cat.total(), 26);
  }

  #[test]
  fn ids_unique_within_track() {
    let cat = Catalog::new(Vec::new());
    for t in Track::ALL {
      let mut seen = std::collections::HashSet::new();
      for c in cat.challenges(t) {
        assert!(seen.insert(c.id.clone()), "duplicate id {} in {}", c.id, t);
        assert_eq!(c.track, t);
      }
    }
  }

  #[test]
  fn extra_entries_append_after_builtins() {
    let extra = ch(
      "PY99", Track::Python, "Extra", Difficulty::Easy,
      "pass", "noop", 1, "none", &["x"],
    );
    let cat = Catalog::new(vec![extra]);
    assert_eq!(cat.track_len(Track::Python), 7);
    assert_eq!(cat.challenges(Track::Python).last().unwrap().id, "PY99");
    assert_eq!(cat.total(), 27);
  }

  #[test]
  fn duplicate_extra_id_is_dropped() {
    let dup = ch(
      "PY01", Track::Python, "Dup", Difficulty::Easy,
      "pass", "noop", 1, "none", &[],
    );
    let cat = Catalog::new(vec![dup]);
    assert_eq!(cat.track_len(Track::Python), 6);
    assert_eq!(cat.challenges(Track::Python)[0].title, "List Summation");
  }
}
