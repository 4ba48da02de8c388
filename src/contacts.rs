use crate::models::Contact;

const AVATAR_BASE: &str = "https://cdn.builder.io/api/v1/image/assets/TEMP";

// (name, avatar asset, presence, last message preview)
const DIRECTORY: &[(&str, &str, &str, &str)] = &[
    ("Helena Hills", "4fc3ce3c5f241ae1317a029ca2739b696f1d3a1f", "Active 20m ago", "Will head to the Help Center..."),
    ("Carlo Emilio", "da398aee2f07e42aad7c4264940b4f7147d029e2", "Active 1h ago", "Let's go"),
    ("Oscar Davis", "02e9b4177263fe056b668f5b19b0e9a6eaa53f5f", "Active 3h ago", "Trueeeeee"),
    ("Daniel Jay Park", "62b99a54869ab244f24c6329ec714d3b6b3d923a", "Active 5h ago", "lol yeah, are you coming to the lunch on the 13th?"),
    ("Mark Rojas", "d01c959e39de7b10ff2989d117d4cccad05d3d64", "Active 1d ago", "great catching up over dinner!!"),
    ("Giannis Constantinou", "f0c9eee260b5fac7bc7a49d88173abbe413461c7", "Active 2d ago", "yep 🫡🫡"),
    ("Briana Lewis", "beb60c3250a176fffabd1857cc57aaf6e83ce51f", "Active 3d ago", "When are you coming back to town? Would love to catch up."),
    ("Mom", "f06306b88ea820dec4f624e5a0edb292f9f8c8c4", "Active 1w ago", "Thanks!"),
    ("Sherry Roy", "87be232e3322f429888624b6fc9fe7115f20d0d2", "Active 1w ago", "Jack needs to find a sitter for the dog and I don't know who's good"),
    ("John Smith", "ad66f676459ed5f9ea472150c2abb0c180dd916f", "Active 2w ago", "sg!"),
];

/// The fixed contact list shown in the sidebar. Purely decorative: every
/// contact shares the same message list.
pub fn default_contacts() -> Vec<Contact> {
    DIRECTORY
        .iter()
        .enumerate()
        .map(|(i, (name, asset, status, last_message))| Contact {
            id: i as u32 + 1,
            name: name.to_string(),
            avatar: format!("{}/{}", AVATAR_BASE, asset),
            status: status.to_string(),
            last_message: last_message.to_string(),
        })
        .collect()
}
