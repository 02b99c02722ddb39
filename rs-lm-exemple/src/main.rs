use rs_lm_core::model::generator::SentenceGenerator;
use rs_lm_core::model::ngram_model::NGramModel;

/// Tiny embedded corpus, one tokenized sentence per line.
const CORPUS: &str = "\
the cat sat on the mat
the dog ran after the cat
the cat ran under the table
a dog sat near the door
a cat chased a mouse
the mouse hid under the table";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tokenize the embedded corpus: one sentence per line, tokens are
    // whitespace-separated (tokenization policy belongs to the caller,
    // the model treats tokens as opaque strings)
    let sentences: Vec<Vec<String>> = CORPUS
        .lines()
        .map(|line| line.split_whitespace().map(str::to_owned).collect())
        .collect();

    // Build a bigram model; all tables are derived eagerly here
    let model = NGramModel::new(2, &sentences)?;

    // Raw counts for an n-gram and for a context
    let the = vec!["the".to_owned()];
    let the_cat = vec!["the".to_owned(), "cat".to_owned()];
    println!("count(the) = {}", model.count(&the)?);
    println!("count(the cat) = {}", model.count(&the_cat)?);

    // Conditional probabilities are relative frequencies; a token never
    // observed after the context gets probability 0
    println!("P(cat | the) = {}", model.cond_prob("cat", &the)?);
    println!("P(dog | the) = {}", model.cond_prob("dog", &the)?);
    println!("P(fish | the) = {}", model.cond_prob("fish", &the)?);

    // Attempting to build a model with an invalid order
    match NGramModel::new(0, &sentences) {
        Ok(_) => println!("Should not happen"),
        Err(_) => println!("Order 0 is invalid, must be >= 1"),
    }

    // Attempting to query with a context of the wrong length
    match model.cond_prob("cat", &the_cat) {
        Ok(_) => println!("Should not happen"),
        Err(_) => println!("A bigram context must hold exactly 1 token"),
    }

    // Score full sentences; the log variant is the numerically stable one
    let sentence: Vec<String> = ["the", "cat", "sat", "on", "the", "mat"]
        .iter()
        .map(|w| (*w).to_owned())
        .collect();
    println!("P(sentence) = {}", model.sent_prob(&sentence));
    println!("log2 P(sentence) = {}", model.sent_log_prob(&sentence));

    // An impossible sentence scores 0, and -inf on the log scale
    let impossible: Vec<String> = ["the", "fish", "sat"].iter().map(|w| (*w).to_owned()).collect();
    println!("P(impossible) = {}", model.sent_prob(&impossible));
    println!("log2 P(impossible) = {}", model.sent_log_prob(&impossible));

    // Seeded generation is reproducible: same model + seed, same output
    let mut generator = SentenceGenerator::from_seed(&model, 42);
    for i in 0..5 {
        let sentence = generator.generate_sentence()?;
        println!("Seeded sentence {}: {}", i + 1, sentence.tokens().join(" "));
    }

    // Generation from the unknown context fails loudly instead of
    // inventing probability mass
    let unknown = vec!["fish".to_owned()];
    match generator.generate_token(&unknown) {
        Ok(_) => println!("Should not happen"),
        Err(_) => println!("This context ('fish') was never seen in training"),
    }

    // A tight token bound marks the sentence as truncated instead of
    // looping forever
    generator.max_tokens = 2;
    let truncated = generator.generate_sentence()?;
    println!(
        "Bounded sentence: {} (truncated: {})",
        truncated.tokens().join(" "),
        truncated.is_truncated()
    );

    // OS-seeded generation, different on every run
    let mut generator = SentenceGenerator::new(&model);
    for i in 0..5 {
        let sentence = generator.generate_sentence()?;
        println!("Random sentence {}: {}", i + 1, sentence.tokens().join(" "));
    }

    Ok(())
}
