use sonic_score::{
    emission::Finish,
    music21_render::RendersToMusic21,
    pipeline::Pipeline,
    primitives::MetreTree,
    script::parse_script,
};

static SCRIPT: &str = r#"
$title = "Suku 'take 1'"
in_thread do
  use_metre [[1/8r, 1/8r, 1/8r], [1/8r, 1/8r, 1/8r]]
  bar do
    use_bpm 92
    add_note :cs4, 0, 1
    add_note [:c4, :eb4], 1, 2
    add_rest 1, 1
  end
  bar do
    add_note :bb3, 0, 2
  end
end
"#;

fn render(script: &str, finish: Finish) -> String {
    let _ = env_logger::builder().is_test(true).try_init();
    let calls = parse_script(script).expect("Can not parse script");
    Pipeline::new(finish)
        .run(&calls)
        .expect("Can not generate score")
        .render_music21()
}

#[test]
fn test_render_program() {
    let program = render(SCRIPT, Finish::Write("out/suku_new.mxl".into()));
    let beat = "meter.MeterSequence([meter.MeterTerminal('1/8'), \
                meter.MeterTerminal('1/8'), meter.MeterTerminal('1/8')])";
    let expected = format!(
        "from fractions import Fraction
from music21 import *

score = stream.Score()
part = stream.Part()
measure = stream.Measure()
measure.append(tempo.MetronomeMark(number=92, referent=Fraction(3, 2)))
n = note.Note('c#4')
n.duration.quarterLength = Fraction(3, 2)
measure.append(n)
n = chord.Chord(['c4', 'e-4'])
n.duration.quarterLength = 1
measure.append(n)
r = note.Rest(quarterLength=Fraction(1, 2))
measure.append(r)
ts = measure.bestTimeSignature()
ts.beatSequence = meter.MeterSequence([{beat}, {beat}])
measure.insert(0, ts)
part.append(measure)
measure = stream.Measure()
n = note.Note('b-3')
n.duration.quarterLength = 3
measure.append(n)
part.append(measure)
score.append(part)
score.metadata = metadata.Metadata(title='Suku \\'take 1\\'')
score.write('musicxml', 'out/suku_new.mxl')
"
    );
    assert_eq!(program, expected);
}

#[test]
fn test_serialized_metre_reads_back() {
    let program = render(SCRIPT, Finish::Show);
    let beat_sequence = program
        .lines()
        .find_map(|line| line.strip_prefix("ts.beatSequence = "))
        .expect("No time signature in program");
    let tree: MetreTree = beat_sequence.parse().unwrap();
    assert_eq!(tree.depth(), 2);
    assert_eq!(tree.child_count(), 2);
    assert!(program.ends_with("score.show()\n"));
}

#[test]
fn test_nested_threads_use_own_parts() {
    let program = render(
        "use_metre [[1, 4], [1, 4]]
        in_thread do
          in_thread do
            bar do add_rest 0, 2 end
          end
          bar do add_rest 0, 2 end
        end
        bar do add_rest 0, 2 end",
        Finish::Show,
    );
    let lines = program
        .lines()
        .filter(|l| l.contains("part") || l.contains("append(measure)"))
        .collect::<Vec<_>>();
    assert_eq!(
        lines,
        vec![
            "part = stream.Part()",
            "part_2 = stream.Part()",
            "part_2.append(measure)",
            "score.append(part_2)",
            "part.append(measure)",
            "score.append(part)",
            "score.append(measure)",
        ]
    );
}
