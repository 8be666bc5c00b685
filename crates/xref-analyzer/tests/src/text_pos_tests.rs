use super::*;

#[test]
fn positions_round_trip_through_utf16_offsets() {
    let index = LineIndex::new("import { Foo } from './b';\nexport const x = new Foo();\n");
    assert_eq!(index.line_count(), 3);
    assert_eq!(index.position(9), Position::new(0, 9));
    assert_eq!(index.position(27), Position::new(1, 0));
    assert_eq!(index.offset(Position::new(1, 13)), Some(40));
    assert_eq!(index.position(40), Position::new(1, 13));
}

#[test]
fn astral_characters_count_as_two_units() {
    let text = "const s = '😀'; let t = 1;";
    let index = LineIndex::new(text);
    let t_byte = text.find("t =").unwrap();
    let t_utf16 = index.byte_to_utf16(t_byte);

    assert_eq!(t_utf16, t_byte - 2);
    assert_eq!(index.utf16_to_byte(t_utf16), t_byte);
    assert_eq!(index.position(t_utf16), Position::new(0, t_utf16 as u32));
}

#[test]
fn out_of_range_inputs_clamp() {
    let index = LineIndex::new("ab\ncd");
    assert_eq!(index.len_utf16(), 5);
    assert_eq!(index.position(100), Position::new(1, 2));
    assert_eq!(index.offset(Position::new(0, 99)), Some(2));
    assert_eq!(index.offset(Position::new(5, 0)), None);
    assert_eq!(index.byte_to_utf16(100), 5);
}

#[test]
fn spans_convert_to_ranges() {
    let index = LineIndex::new("declare module \"d\" {\n    interface I {\n        target: string;\n    }\n}\n");
    let span = TextSpan::new(35, 1);
    let range = index.range(span);
    assert_eq!(range, Range::new(Position::new(1, 14), Position::new(1, 15)));
    assert_eq!(index.span(range), Some(span));
}

#[test]
fn line_text_strips_terminators() {
    let index = LineIndex::new("one\r\ntwo\n");
    assert_eq!(index.line_text(0), Some("one"));
    assert_eq!(index.line_text(1), Some("two"));
    assert_eq!(index.line_text(2), Some(""));
    assert_eq!(index.line_text(3), None);
}
