use fooked::{execute, parse, Error, InstructionKind, Machine, Position, StatusKind};

fn run(src: &str, tape_size: usize, input: Option<&str>) -> (Result<(), Error>, Machine, Vec<u8>) {
    let program = parse(src).expect("program should parse");
    let mut machine = Machine::new(tape_size, input.map(|s| s.as_bytes().to_vec()));
    let mut out = Vec::new();
    let result = execute(&program, &mut machine, &mut out);
    (result, machine, out)
}

/// Every `[` and `]` is paired: the `]` re-enters right after its `[`, and
/// the `[` skips to right after its `]`.
fn assert_loops_paired(src: &str) {
    let program = parse(src).unwrap();
    let mut open = Vec::new();
    for (id, instr) in program.iter().enumerate() {
        match instr.kind {
            InstructionKind::LoopStart => open.push(id),
            InstructionKind::LoopEnd => {
                let start = open.pop().expect("balanced");
                assert_eq!(instr.jump_target, Some(start + 1), "`]` at {id} in {src:?}");
                assert_eq!(program.get(start).unwrap().jump_target, program.next(id), "`[` at {start} in {src:?}");
            }
            _ => assert_eq!(instr.jump_target, None),
        }
    }
    assert!(open.is_empty());
}

#[test]
fn balanced_sources_parse_with_paired_loops() {
    for src in ["[]", "[[]]", "+[>[-]<-]>.", "[][][]", "[[[+]]-]", "a[b]c\n[d[e]f]"] {
        assert_loops_paired(src);
    }
}

#[test]
fn bracket_errors() {
    let err = parse("]").unwrap_err();
    assert_eq!(err.status(), StatusKind::UnmatchedLoopEnd);
    assert_eq!(err.position(), Position::new(1, 1));

    let err = parse("[").unwrap_err();
    assert_eq!(err.status(), StatusKind::UnclosedLoopStart);
    assert_eq!(err.position(), Position::new(1, 1));
}

#[test]
fn run_length_merging() {
    let one = |src: &str| parse(src).unwrap().iter().map(|i| i.repeat).collect::<Vec<_>>();
    assert_eq!(one("+++"), vec![3]);
    assert_eq!(one("+++\n+++"), vec![6]);
    assert_eq!(one("+.+"), vec![1, 1, 1]);
}

#[test]
fn move_and_add_round_trip() {
    let (result, machine, _) = run("++>++<[->+<]", 3, None);
    assert!(result.is_ok());
    assert_eq!(machine.tape()[0], 0);
    assert_eq!(machine.tape()[1], 4);
    assert_eq!(machine.pointer(), 0);
}

#[test]
fn output_fidelity() {
    let (result, _, out) = run(&format!("{}.", "+".repeat(33)), 1, None);
    assert!(result.is_ok());
    assert_eq!(out, vec![33]);
}

#[test]
fn bounds_faults() {
    let (result, _, _) = run(">", 1, None);
    let err = result.unwrap_err();
    assert_eq!(err.status(), StatusKind::DataPointerOutOfBounds);
    assert_eq!(err.position(), Position::new(1, 1));

    let (result, machine, _) = run("<", 1, None);
    assert_eq!(result.unwrap_err().status(), StatusKind::DataPointerOutOfBounds);
    assert_eq!(machine.tape(), &[0]);
}

#[test]
fn idempotent_parse() {
    let src = "+[>,.<-]";
    assert_eq!(parse(src).unwrap(), parse(src).unwrap());
}

#[test]
fn input_exhaustion_rereads_final_byte() {
    let (result, machine, _) = run(",>,", 2, Some("a"));
    assert!(result.is_ok());
    assert_eq!(machine.tape(), b"aa");
    assert_eq!(machine.input_cursor(), 0);
}

#[test]
fn merged_program_matches_unmerged_semantics() {
    // Same program with runs broken up by comments; results must agree.
    let merged = "++++++++[>++++<-]>+.";
    let spread = "++ ++ ++ ++\n[> + + + + < -]\n> + .";
    let (r1, m1, o1) = run(merged, 4, None);
    let (r2, m2, o2) = run(spread, 4, None);
    assert!(r1.is_ok() && r2.is_ok());
    assert_eq!(m1.tape(), m2.tape());
    assert_eq!(o1, o2);
    assert_eq!(o1, b"!");
}
