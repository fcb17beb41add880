use rand::{seq::SliceRandom, Rng};

const FACTS: &[&str] = &[
    "Honey never spoils; edible honey has been found in ancient Egyptian tombs.",
    "Octopuses have three hearts and blue blood.",
    "A day on Venus is longer than a year on Venus.",
    "Bananas are berries, but strawberries are not.",
    "The Eiffel Tower can be about 15 cm taller in summer because the iron expands.",
    "Wombat droppings are cube-shaped.",
    "Sharks existed before trees did.",
    "There are more possible games of chess than atoms in the observable universe.",
    "A group of flamingos is called a flamboyance.",
    "The shortest war in history, between Britain and Zanzibar in 1896, lasted under 45 minutes.",
    "Sea otters hold hands while sleeping so they don't drift apart.",
    "The human nose can distinguish at least one trillion different smells.",
    "Hot water can freeze faster than cold water under some conditions; this is called the Mpemba effect.",
    "Cleopatra lived closer in time to the Moon landing than to the building of the Great Pyramid.",
    "Butterflies taste with their feet.",
    "A single cloud can weigh more than a million pounds.",
    "The inventor of the Pringles can was buried in one.",
    "Scotland's national animal is the unicorn.",
    "An ostrich's eye is bigger than its brain.",
    "Some turtles can breathe through their rear ends.",
    "Neutron stars are so dense that a teaspoon of one would weigh about a billion tons.",
    "The dot over a lowercase i or j is called a tittle.",
    "Cows have best friends and get stressed when separated.",
    "Venus is the only planet in the solar system that spins clockwise.",
    "A bolt of lightning is about five times hotter than the surface of the Sun.",
    "The longest recorded flight of a chicken is 13 seconds.",
    "Koalas sleep up to 22 hours a day.",
    "There are more trees on Earth than stars in the Milky Way.",
    "Oxford University is older than the Aztec Empire.",
    "Pineapples take about two years to grow.",
    "Saturn would float in water if you could find a bathtub big enough.",
    "Snails can sleep for up to three years.",
    "Your stomach gets a new lining every few days so it doesn't digest itself.",
    "The first oranges weren't orange; they were green.",
    "Humans share about 60% of their DNA with bananas.",
    "Polar bear fur is actually transparent, not white.",
    "A jiffy is an actual unit of time: 1/100th of a second.",
    "Apollo astronauts' footprints on the Moon will likely last millions of years.",
    "The word 'nerd' was first coined by Dr. Seuss in 'If I Ran the Zoo'.",
    "Kangaroos can't walk backwards easily.",
];

pub fn random_fact<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FACTS.choose(rng).copied().unwrap_or(FACTS[0])
}
