use microgrammar::{
    matcher::{integer, regex},
    Definitions, Microgrammar,
};

fn main() {
    // find every `key = value` assignment buried in a noisy config
    let mg = Microgrammar::from_string("${key} = ${value}")
        .definitions(
            Definitions::new()
                .define("key", regex("[a-z_]+").unwrap())
                .unwrap()
                .define("value", integer())
                .unwrap(),
        )
        .compile()
        .unwrap();

    let content = "# tuning\nretries = 3\n# unrelated prose\ndelay_ms = 250\n";
    for m in mg.find_matches(content) {
        let tree = m.as_tree().unwrap();
        println!(
            "{} -> {} (at byte {})",
            tree.text("key").unwrap(),
            tree.integer("value").unwrap(),
            m.offset()
        );
    }

    // rewrite one of the matched regions in place
    let matches = mg.find_matches(content);
    let tree = matches[0].as_tree().unwrap();
    let mut updater = Microgrammar::updatable_match(tree, content);
    updater.set("value", "5").unwrap();
    print!("{}", updater.new_content());
}
