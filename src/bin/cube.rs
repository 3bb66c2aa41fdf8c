use vitrine::{exhibit, pages};

fn main() -> anyhow::Result<()> {
    exhibit::run(vec![pages::cube::constructor()])
}
