//! End-to-end script evaluation through `run_source` and a capture host

mod common;

use code_studio::script::ErrorKind;
use common::{run_script, script_output};

#[test]
fn test_hello_world() {
    assert_eq!(script_output("print('Hello, World!')\n"), "Hello, World!\n");
}

#[test]
fn test_empty_buffer_prints_nothing() {
    assert_eq!(script_output(""), "");
    assert_eq!(script_output("# only a comment\n\n"), "");
}

#[test]
fn test_print_separator_and_end() {
    let src = "print('a', 'b', sep='-', end='')\nprint('|', 1, 2.5, None, True)";
    assert_eq!(script_output(src), "a-b| 1 2.5 None True\n");
}

#[test]
fn test_fizzbuzz() {
    let src = "\
for i in range(1, 16):
    if i % 15 == 0:
        print('FizzBuzz')
    elif i % 3 == 0:
        print('Fizz')
    elif i % 5 == 0:
        print('Buzz')
    else:
        print(i)
";
    let out = script_output(src);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[2], "Fizz");
    assert_eq!(lines[4], "Buzz");
    assert_eq!(lines[14], "FizzBuzz");
    assert_eq!(lines[6], "7");
}

#[test]
fn test_word_count_with_dict() {
    let src = "\
text = 'the cat and the hat and the bat'
counts = {}
for word in text.split():
    counts[word] = counts.get(word, 0) + 1
for word in sorted(counts.keys()):
    print(word, counts[word])
";
    assert_eq!(
        script_output(src),
        "and 2\nbat 1\ncat 1\nhat 1\nthe 3\n"
    );
}

#[test]
fn test_recursive_fibonacci() {
    let src = "\
def fib(n):
    if n < 2:
        return n
    return fib(n - 1) + fib(n - 2)

print(fib(15))
";
    assert_eq!(script_output(src), "610\n");
}

#[test]
fn test_unsupported_syntax_is_rejected_before_running() {
    let (host, result) = run_script("print('start')\nsquares = [x * x for x in range(3)]\n", &[]);
    assert_eq!(host.output, "");
    assert_eq!(result.unwrap_err().kind, ErrorKind::SyntaxError);
}

#[test]
fn test_string_methods_and_fstrings() {
    let src = "\
name = '  ada lovelace  '
clean = name.strip().title()
print(clean, len(clean))
print(clean.upper().replace('LOVELACE', 'L.'))
print(f'{clean} was born in {1815}')
print('-'.join(['a', 'b', 'c']))
";
    assert_eq!(
        script_output(src),
        "Ada Lovelace 12\nADA L.\nAda Lovelace was born in 1815\na-b-c\n"
    );
}

#[test]
fn test_list_operations() {
    let src = "\
items = [5, 3, 8]
items.append(1)
items.sort()
print(items, sum(items), min(items), max(items))
print(items.pop(), items)
print(list(reversed(items)))
";
    assert_eq!(
        script_output(src),
        "[1, 3, 5, 8] 17 1 8\n8 [1, 3, 5]\n[5, 3, 1]\n"
    );
}

#[test]
fn test_input_prompts_are_passed_to_host() {
    let src = "\
name = input('Name? ')
age = int(input('Age? '))
print(f'Hello {name}, next year you are {age + 1}')
";
    let (host, result) = run_script(src, &["Grace", "85"]);
    assert!(result.is_ok());
    assert_eq!(host.prompts, vec!["Name? ", "Age? "]);
    assert_eq!(host.output, "Hello Grace, next year you are 86\n");
}

#[test]
fn test_input_without_answer_is_empty_string() {
    let (host, result) = run_script("x = input()\nprint(repr(x), len(x))", &[]);
    assert!(result.is_ok());
    assert_eq!(host.prompts, vec![""]);
    assert_eq!(host.output, "'' 0\n");
}

#[test]
fn test_output_before_error_is_kept() {
    let (host, result) = run_script("print('before')\nprint(1 / 0)\nprint('after')", &[]);
    assert_eq!(host.output, "before\n");
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ZeroDivisionError);
    assert_eq!(err.to_string(), "division by zero");
}

#[test]
fn test_bad_int_conversion_message() {
    let (_, result) = run_script("int(input())", &["twelve"]);
    assert_eq!(
        result.unwrap_err().to_string(),
        "invalid literal for int() with base 10: 'twelve'"
    );
}

#[test]
fn test_syntax_error_reports_line() {
    let (host, result) = run_script("print('ok')\nif True\n    print('x')\n", &[]);
    // Nothing runs when the program does not parse
    assert_eq!(host.output, "");
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert_eq!(err.line, Some(2));
    assert!(err.to_string().contains("(line 2)"));
}

#[test]
fn test_indentation_error() {
    let (_, result) = run_script("def f():\nreturn 1\n", &[]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::IndentationError);
}

#[test]
fn test_exception_handling_inside_functions() {
    let src = "\
def safe_div(a, b):
    try:
        return a / b
    except ZeroDivisionError as e:
        print('error:', e)
        return None
    finally:
        print('checked', a, b)

print(safe_div(6, 3))
print(safe_div(1, 0))
";
    assert_eq!(
        script_output(src),
        "checked 6 3\n2.0\nerror: division by zero\nchecked 1 0\nNone\n"
    );
}

#[test]
fn test_runaway_recursion_is_an_error_not_a_crash() {
    let (_, result) = run_script("def f(n):\n    return f(n + 1)\nf(0)\n", &[]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::RecursionError);
}

#[test]
fn test_huge_slice_steps_stop_at_the_end() {
    let src = "\
print('abc'[1::9223372036854775807])
print('abcdef'[::-9223372036854775807])
print([1, 2, 3][-1::-9223372036854775807 - 1])
";
    assert_eq!(script_output(src), "b\nf\n[3]\n");
}

#[test]
fn test_oversized_format_precision_is_value_error() {
    let (host, result) = run_script("print('ok')\nprint(f'{1.5:.70000f}'[:5])\n", &[]);
    assert_eq!(host.output, "ok\n");
    let err = result.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValueError);
    assert_eq!(err.message, "Too many decimal digits in format string");
}

#[test]
fn test_len_of_huge_range_overflows() {
    let big = "range(-9223372036854775807, 9223372036854775807)";
    assert_eq!(
        script_output(&format!("r = {}\nprint(r[-1], r[0], bool(r))\n", big)),
        "9223372036854775806 -9223372036854775807 True\n"
    );
    let (_, result) = run_script(&format!("print(len({}))\n", big), &[]);
    assert_eq!(result.unwrap_err().kind, ErrorKind::OverflowError);
}
