//! List the built-in languages.

pub fn run() {
    let langs = stolyar_langs::all();
    println!("Built-in languages ({}):", langs.len());
    for language in langs {
        println!("  {}", language.name());
    }
}
