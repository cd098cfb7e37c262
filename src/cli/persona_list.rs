use crate::core::persona::Persona;

pub fn list_personas() {
    println!("Available personas:\n");
    for persona in Persona::ALL {
        println!("  • {persona}");
        println!("    {}", persona.system_instruction());
    }
    println!("\n💡 Start with a persona:");
    println!("   nexus --persona coder");
}
